use std::collections::HashMap;
use std::fmt;

pub const LEGACY_GROUP: &str = "traefik.containo.us";
pub const CURRENT_GROUP: &str = "traefik.io";
pub const VERSION: &str = "v1alpha1";

/// Resource kinds the tool decodes into typed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
	LegacyIngressRoute,
	LegacyMiddleware,
	IngressRoute,
	Middleware,
}

impl ResourceKind {
	pub const ALL: [ResourceKind; 4] = [
		ResourceKind::LegacyIngressRoute,
		ResourceKind::LegacyMiddleware,
		ResourceKind::IngressRoute,
		ResourceKind::Middleware,
	];

	pub fn group(self) -> &'static str {
		match self {
			ResourceKind::LegacyIngressRoute | ResourceKind::LegacyMiddleware => LEGACY_GROUP,
			ResourceKind::IngressRoute | ResourceKind::Middleware => CURRENT_GROUP,
		}
	}

	pub fn kind(self) -> &'static str {
		match self {
			ResourceKind::LegacyIngressRoute | ResourceKind::IngressRoute => "IngressRoute",
			ResourceKind::LegacyMiddleware | ResourceKind::Middleware => "Middleware",
		}
	}

	pub fn api_version(self) -> String {
		format!("{}/{VERSION}", self.group())
	}
}

impl fmt::Display for ResourceKind {
	/// Formats as `Kind.group`, e.g. `IngressRoute.traefik.containo.us`.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}", self.kind(), self.group())
	}
}

/// Registry of known group/kinds.
///
/// Built once by the caller and passed by reference to the decoder and the
/// converters. Lookups ignore the API version, only group and kind matter.
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
	kinds: HashMap<(String, String), ResourceKind>,
}

impl KindRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// A registry with every Traefik kind the tool understands.
	pub fn traefik() -> Self {
		let mut registry = Self::new();
		for kind in ResourceKind::ALL {
			registry.register(kind);
		}
		registry
	}

	pub fn register(&mut self, kind: ResourceKind) {
		self.kinds
			.insert((kind.group().to_string(), kind.kind().to_string()), kind);
	}

	/// Look up the kind of a manifest from its `apiVersion` and `kind` fields.
	pub fn lookup(&self, api_version: &str, kind: &str) -> Option<ResourceKind> {
		let group = match api_version.split_once('/') {
			Some((group, _version)) => group,
			None => "",
		};
		self.kinds
			.get(&(group.to_string(), kind.to_string()))
			.copied()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_lookup_by_group_and_kind() {
		let registry = KindRegistry::traefik();
		assert_eq!(
			registry.lookup("traefik.containo.us/v1alpha1", "IngressRoute"),
			Some(ResourceKind::LegacyIngressRoute)
		);
		assert_eq!(
			registry.lookup("traefik.io/v1alpha1", "Middleware"),
			Some(ResourceKind::Middleware)
		);
		// Version is not part of the key.
		assert_eq!(
			registry.lookup("traefik.containo.us/v1beta1", "Middleware"),
			Some(ResourceKind::LegacyMiddleware)
		);
		assert_eq!(registry.lookup("v1", "Service"), None);
		assert_eq!(registry.lookup("traefik.io/v1alpha1", "TLSOption"), None);
	}

	#[test]
	fn test_empty_registry() {
		let registry = KindRegistry::new();
		assert_eq!(registry.lookup("traefik.io/v1alpha1", "IngressRoute"), None);
	}

	#[test]
	fn test_display_and_api_version() {
		assert_eq!(
			ResourceKind::LegacyIngressRoute.to_string(),
			"IngressRoute.traefik.containo.us"
		);
		assert_eq!(ResourceKind::Middleware.api_version(), "traefik.io/v1alpha1");
	}
}
