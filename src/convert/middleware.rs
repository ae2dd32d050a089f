use crate::convert::deprecated::configured_removed_options;
use crate::convert::schema::AnnotationFilter;
use crate::convert::{Convert, ConvertOptions};
use crate::error::{MigrateError, Result};
use crate::resource::{Manifest, ResourceKind, current, legacy};
use tracing::warn;

/// Converts v2 `Middleware`s.
///
/// Options removed in v3 are dropped with a warning; `ipWhiteList` becomes `ipAllowList`.
#[derive(Debug, Clone)]
pub struct MiddlewareConverter {
	annotations: AnnotationFilter,
}

impl MiddlewareConverter {
	pub fn new(options: &ConvertOptions) -> Self {
		MiddlewareConverter {
			annotations: AnnotationFilter::new(&options.skip_annotations),
		}
	}

	pub fn convert_middleware(&self, middleware: &legacy::Middleware) -> current::Middleware {
		let removed = configured_removed_options(&middleware.spec);
		if !removed.is_empty() {
			let options: Vec<String> = removed.iter().map(|option| option.to_string()).collect();
			warn!(
				middleware = %middleware.metadata.name,
				options = %options.join(", "),
				"middleware configures options removed in v3; they are dropped and must be migrated manually"
			);
		}

		current::Middleware {
			api_version: ResourceKind::Middleware.api_version(),
			kind: middleware.kind.clone(),
			metadata: self.annotations.metadata(&middleware.metadata),
			spec: current::MiddlewareSpec::from(&middleware.spec),
		}
	}
}

impl Convert for MiddlewareConverter {
	fn convert(&self, manifest: &Manifest) -> Result<Manifest> {
		match manifest {
			Manifest::LegacyMiddleware(middleware) => {
				Ok(Manifest::Middleware(self.convert_middleware(middleware)))
			}
			other => Err(MigrateError::KindMismatch {
				expected: ResourceKind::LegacyMiddleware.to_string(),
				found: other.kind().to_string(),
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::resource::{KindRegistry, decode_manifests, encode_manifest};

	fn legacy_middleware(input: &str) -> legacy::Middleware {
		match decode_manifests(input, &KindRegistry::traefik())
			.unwrap()
			.remove(0)
		{
			Manifest::LegacyMiddleware(middleware) => middleware,
			other => panic!("Expected a v2 Middleware, got {other:?}"),
		}
	}

	#[test]
	fn test_convert_ip_white_list() {
		let middleware = legacy_middleware(
			r#"
apiVersion: traefik.containo.us/v1alpha1
kind: Middleware
metadata:
  name: office-only
  namespace: apps
spec:
  ipWhiteList:
    sourceRange:
      - 10.0.0.0/8
      - 192.168.1.7
    ipStrategy: {}
"#,
		);

		let converted = MiddlewareConverter::new(&ConvertOptions::default())
			.convert_middleware(&middleware);
		assert_eq!(converted.api_version, "traefik.io/v1alpha1");
		assert_eq!(converted.metadata.namespace.as_deref(), Some("apps"));

		let encoded = encode_manifest(&Manifest::Middleware(converted)).unwrap();
		let value: serde_yaml::Value = serde_yaml::from_str(&encoded).unwrap();
		let expected: serde_yaml::Value = serde_yaml::from_str(
			r#"
apiVersion: traefik.io/v1alpha1
kind: Middleware
metadata:
  name: office-only
  namespace: apps
spec:
  ipAllowList:
    sourceRange:
      - 10.0.0.0/8
      - 192.168.1.7
"#,
		)
		.unwrap();
		assert_eq!(value, expected);
	}

	#[test]
	fn test_convert_drops_removed_header_options() {
		let middleware = legacy_middleware(
			r#"
apiVersion: traefik.containo.us/v1alpha1
kind: Middleware
metadata:
  name: secure-headers
spec:
  headers:
    sslRedirect: true
    sslHost: example.com
    stsSeconds: 31536000
    customResponseHeaders:
      X-Frame-Options: DENY
"#,
		);

		let converted = MiddlewareConverter::new(&ConvertOptions::default())
			.convert_middleware(&middleware);
		let headers = converted.spec.headers.unwrap();
		assert_eq!(
			headers.settings.keys().collect::<Vec<_>>(),
			vec!["customResponseHeaders", "stsSeconds"]
		);
	}

	#[test]
	fn test_convert_omits_blocks_left_empty() {
		let converter = MiddlewareConverter::new(&ConvertOptions::default());

		for input in [
			"apiVersion: traefik.containo.us/v1alpha1\nkind: Middleware\nmetadata:\n  name: strip\nspec:\n  stripPrefix:\n    forceSlash: true\n",
			"apiVersion: traefik.containo.us/v1alpha1\nkind: Middleware\nmetadata:\n  name: redirect\nspec:\n  headers:\n    sslRedirect: true\n",
		] {
			let converted = converter.convert_middleware(&legacy_middleware(input));
			assert_eq!(converted.spec, current::MiddlewareSpec::default());

			let encoded = encode_manifest(&Manifest::Middleware(converted)).unwrap();
			assert!(!encoded.contains("stripPrefix"), "{encoded}");
			assert!(!encoded.contains("headers"), "{encoded}");
		}
	}

	#[test]
	fn test_convert_passes_other_middlewares() {
		let middleware = legacy_middleware(
			r#"
apiVersion: traefik.containo.us/v1alpha1
kind: Middleware
metadata:
  name: https
spec:
  redirectScheme:
    scheme: https
    permanent: true
"#,
		);

		let converted = MiddlewareConverter::new(&ConvertOptions::default())
			.convert_middleware(&middleware);
		assert!(converted.spec.other.contains_key("redirectScheme"));
		assert!(converted.spec.headers.is_none());
	}
}
