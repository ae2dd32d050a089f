//! Conversion of v2 Traefik resources into v3 ones.
//!
//! This module handles:
//! - Per-kind converters behind the [`Convert`] trait
//! - Field mapping between the v2 and v3 schemas
//! - Detection of middleware options removed in v3
//! - Batch conversion where one bad resource does not stop the others

pub mod deprecated;
pub mod ingress_route;
pub mod middleware;
pub mod schema;

pub use deprecated::{REMOVED_OPTIONS, RemovedOption, configured_removed_options, has_removed_options};
pub use ingress_route::IngressRouteConverter;
pub use middleware::MiddlewareConverter;
pub use schema::{AnnotationFilter, LAST_APPLIED_CONFIGURATION};

use crate::config::MergedConfig;
use crate::error::{MigrateError, Result};
use crate::resource::{Manifest, ResourceKind};
use std::collections::HashMap;
use tracing::{error, info};

/// Converts one manifest of a registered kind.
pub trait Convert {
	fn convert(&self, manifest: &Manifest) -> Result<Manifest>;
}

/// Settings shared by every converter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertOptions {
	/// Keep v2 rules verbatim and tag routes with `syntax: v2`.
	pub keep_syntax: bool,
	/// Annotation keys dropped in addition to the `kubectl` one.
	pub skip_annotations: Vec<String>,
}

impl From<&MergedConfig> for ConvertOptions {
	fn from(config: &MergedConfig) -> Self {
		ConvertOptions {
			keep_syntax: config.keep_syntax,
			skip_annotations: config.skip_annotations.clone(),
		}
	}
}

/// Outcome of converting a batch of manifests.
#[derive(Debug, Default)]
pub struct ConversionReport {
	/// Converted manifests plus pass-through ones, in input order.
	pub converted: Vec<Manifest>,
	/// One error per resource that failed, each wrapped in [`MigrateError::Resource`].
	pub failures: Vec<MigrateError>,
}

impl ConversionReport {
	pub fn is_success(&self) -> bool {
		self.failures.is_empty()
	}
}

/// Dispatches manifests to the converter registered for their kind.
pub struct Converter {
	converters: HashMap<ResourceKind, Box<dyn Convert>>,
}

impl Converter {
	/// A converter for v2 `IngressRoute`s and `Middleware`s.
	pub fn new(options: &ConvertOptions) -> Result<Self> {
		let mut converters: HashMap<ResourceKind, Box<dyn Convert>> = HashMap::new();
		converters.insert(
			ResourceKind::LegacyIngressRoute,
			Box::new(IngressRouteConverter::new(options)?),
		);
		converters.insert(
			ResourceKind::LegacyMiddleware,
			Box::new(MiddlewareConverter::new(options)),
		);
		Ok(Converter { converters })
	}

	pub fn handles(&self, kind: ResourceKind) -> bool {
		self.converters.contains_key(&kind)
	}

	/// Convert one manifest. Manifests without a registered converter come back unchanged.
	///
	/// Errors are wrapped in [`MigrateError::Resource`] naming the failed object.
	pub fn convert(&self, manifest: &Manifest) -> Result<Manifest> {
		let Some(converter) = manifest
			.resource_kind()
			.and_then(|kind| self.converters.get(&kind))
		else {
			return Ok(manifest.clone());
		};

		let converted = converter
			.convert(manifest)
			.map_err(|source| MigrateError::Resource {
				kind: manifest.kind().to_string(),
				namespace: manifest.namespace().to_string(),
				name: manifest.name().to_string(),
				source: Box::new(source),
			})?;

		info!(
			kind = manifest.kind(),
			namespace = manifest.namespace(),
			name = manifest.name(),
			"converted resource"
		);
		Ok(converted)
	}

	/// Convert every manifest, continuing past resources that fail.
	pub fn convert_all(&self, manifests: &[Manifest]) -> ConversionReport {
		let mut report = ConversionReport::default();

		for manifest in manifests {
			match self.convert(manifest) {
				Ok(converted) => report.converted.push(converted),
				Err(err) => {
					error!(error = %error_chain(&err), "failed to convert resource");
					report.failures.push(err);
				}
			}
		}

		report
	}
}

/// Render an error and its sources on one line.
pub fn error_chain(err: &dyn std::error::Error) -> String {
	let mut rendered = err.to_string();
	let mut source = err.source();
	while let Some(cause) = source {
		rendered.push_str(": ");
		rendered.push_str(&cause.to_string());
		source = cause.source();
	}
	rendered
}
