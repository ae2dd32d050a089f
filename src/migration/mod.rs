//! Migration of stored v2 resources into their v3 counterparts.
//!
//! Objects are read from a [`ResourceStore`], converted and created back
//! under the v3 API group. Existing v3 objects are never overwritten.

pub mod store;

pub use store::{CreateOutcome, DirectoryStore, ResourceStore};

use crate::convert::{Converter, error_chain, has_removed_options};
use crate::error::Result;
use crate::resource::{DEFAULT_NAMESPACE, Manifest, ResourceKind};
use std::fmt;
use tracing::{error, info, warn};

/// Resource types `migrate` can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
	IngressRoute,
	Middleware,
}

impl ResourceType {
	/// The v2 kind objects are read as.
	pub fn source_kind(self) -> ResourceKind {
		match self {
			ResourceType::IngressRoute => ResourceKind::LegacyIngressRoute,
			ResourceType::Middleware => ResourceKind::LegacyMiddleware,
		}
	}
}

impl fmt::Display for ResourceType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ResourceType::IngressRoute => f.write_str("ingressroute"),
			ResourceType::Middleware => f.write_str("middleware"),
		}
	}
}

/// What to migrate.
#[derive(Debug, Clone)]
pub struct MigrationRequest {
	pub resource_type: ResourceType,
	/// Migrate a single object; every object of the type otherwise.
	pub name: Option<String>,
	/// Restrict to one namespace; all namespaces when unset.
	pub namespace: Option<String>,
	pub dry_run: bool,
	/// Leave middlewares that configure options removed in v3 for manual migration.
	pub skip_deprecated: bool,
}

impl MigrationRequest {
	pub fn new(resource_type: ResourceType) -> Self {
		MigrationRequest {
			resource_type,
			name: None,
			namespace: None,
			dry_run: false,
			skip_deprecated: false,
		}
	}
}

/// Objects touched by a migration, as `namespace/name`.
#[derive(Debug, Default)]
pub struct MigrationReport {
	pub created: Vec<String>,
	pub already_exists: Vec<String>,
	pub skipped: Vec<String>,
	/// Conversion failures; the objects were left alone.
	pub failures: Vec<crate::error::MigrateError>,
}

impl MigrationReport {
	pub fn is_success(&self) -> bool {
		self.failures.is_empty()
	}
}

/// Migrate the objects selected by `request`.
///
/// A conversion failure is recorded and the batch continues. Objects that
/// already exist are skipped. Any other store error aborts the batch.
pub fn migrate(
	store: &dyn ResourceStore,
	converter: &Converter,
	request: &MigrationRequest,
) -> Result<MigrationReport> {
	let kind = request.resource_type.source_kind();
	let objects = match &request.name {
		Some(name) => {
			let namespace = request.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE);
			vec![store.get(kind, namespace, name)?]
		}
		None => store.list(kind, request.namespace.as_deref())?,
	};

	let mut report = MigrationReport::default();
	for object in &objects {
		let id = format!("{}/{}", object.namespace(), object.name());

		if request.skip_deprecated
			&& let Manifest::LegacyMiddleware(middleware) = object
			&& has_removed_options(&middleware.spec)
		{
			warn!(
				middleware = %id,
				"middleware configures options removed in v3 and must be migrated manually, skipping"
			);
			report.skipped.push(id);
			continue;
		}

		let converted = match converter.convert(object) {
			Ok(converted) => converted,
			Err(err) => {
				error!(error = %error_chain(&err), "failed to migrate resource");
				report.failures.push(err);
				continue;
			}
		};

		match store.create(&converted, request.dry_run)? {
			CreateOutcome::Created => {
				info!(
					resource = %id,
					kind = converted.kind(),
					dry_run = request.dry_run,
					"created resource"
				);
				report.created.push(id);
			}
			CreateOutcome::AlreadyExists => {
				warn!(
					resource = %id,
					kind = converted.kind(),
					"resource already exists, skipping"
				);
				report.already_exists.push(id);
			}
		}
	}

	Ok(report)
}
