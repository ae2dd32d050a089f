//! Traefik custom resources and their YAML representation.
//!
//! This module handles:
//! - Typed v2 and v3 `IngressRoute` / `Middleware` resources
//! - The registry of known group/kinds
//! - Multi-document YAML decoding and encoding

pub mod codec;
pub mod common;
pub mod current;
pub mod legacy;
pub mod registry;

pub use codec::{decode_manifests, decode_value, encode_manifest, encode_manifests};
pub use common::ObjectMeta;
pub use registry::{KindRegistry, ResourceKind};

use serde::Serialize;
use serde_yaml::Value;

/// Namespace assumed for objects that do not set one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// One decoded manifest document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Manifest {
	LegacyIngressRoute(legacy::IngressRoute),
	LegacyMiddleware(legacy::Middleware),
	IngressRoute(current::IngressRoute),
	Middleware(current::Middleware),
	/// A document of a kind missing from the registry, kept as raw YAML.
	Opaque(Value),
}

impl Manifest {
	/// The registered kind, or `None` for opaque documents.
	pub fn resource_kind(&self) -> Option<ResourceKind> {
		match self {
			Manifest::LegacyIngressRoute(_) => Some(ResourceKind::LegacyIngressRoute),
			Manifest::LegacyMiddleware(_) => Some(ResourceKind::LegacyMiddleware),
			Manifest::IngressRoute(_) => Some(ResourceKind::IngressRoute),
			Manifest::Middleware(_) => Some(ResourceKind::Middleware),
			Manifest::Opaque(_) => None,
		}
	}

	pub fn metadata(&self) -> Option<&ObjectMeta> {
		match self {
			Manifest::LegacyIngressRoute(route) => Some(&route.metadata),
			Manifest::LegacyMiddleware(middleware) => Some(&middleware.metadata),
			Manifest::IngressRoute(route) => Some(&route.metadata),
			Manifest::Middleware(middleware) => Some(&middleware.metadata),
			Manifest::Opaque(_) => None,
		}
	}

	pub fn api_version(&self) -> &str {
		match self {
			Manifest::LegacyIngressRoute(route) => &route.api_version,
			Manifest::LegacyMiddleware(middleware) => &middleware.api_version,
			Manifest::IngressRoute(route) => &route.api_version,
			Manifest::Middleware(middleware) => &middleware.api_version,
			Manifest::Opaque(value) => opaque_str(value, &["apiVersion"]),
		}
	}

	pub fn kind(&self) -> &str {
		match self {
			Manifest::LegacyIngressRoute(route) => &route.kind,
			Manifest::LegacyMiddleware(middleware) => &middleware.kind,
			Manifest::IngressRoute(route) => &route.kind,
			Manifest::Middleware(middleware) => &middleware.kind,
			Manifest::Opaque(value) => opaque_str(value, &["kind"]),
		}
	}

	pub fn name(&self) -> &str {
		match (self, self.metadata()) {
			(_, Some(metadata)) => &metadata.name,
			(Manifest::Opaque(value), None) => opaque_str(value, &["metadata", "name"]),
			_ => "",
		}
	}

	/// The object's namespace, [`DEFAULT_NAMESPACE`] when unset.
	pub fn namespace(&self) -> &str {
		let namespace = match (self, self.metadata()) {
			(_, Some(metadata)) => metadata.namespace.as_deref().unwrap_or_default(),
			(Manifest::Opaque(value), None) => opaque_str(value, &["metadata", "namespace"]),
			_ => "",
		};
		if namespace.is_empty() {
			DEFAULT_NAMESPACE
		} else {
			namespace
		}
	}
}

fn opaque_str<'a>(value: &'a Value, path: &[&str]) -> &'a str {
	path.iter()
		.try_fold(value, |value, key| value.get(key))
		.and_then(Value::as_str)
		.unwrap_or_default()
}
