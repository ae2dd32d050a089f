use crate::error::{MigrateError, Result};
use crate::resource::registry::{KindRegistry, ResourceKind};
use crate::resource::Manifest;
use serde::Deserialize;
use serde_yaml::Value;
use tracing::debug;

/// Separator placed between documents of an encoded manifest stream.
pub const DOCUMENT_SEPARATOR: &str = "---\n";

/// Decode a multi-document YAML stream.
///
/// Empty documents are skipped. Documents of registered kinds decode into
/// typed resources; everything else is kept as an opaque YAML value.
pub fn decode_manifests(input: &str, registry: &KindRegistry) -> Result<Vec<Manifest>> {
	let mut manifests = Vec::new();

	for (document, deserializer) in serde_yaml::Deserializer::from_str(input).enumerate() {
		let value = Value::deserialize(deserializer)
			.map_err(|source| MigrateError::ManifestDecode { document, source })?;
		if value.is_null() {
			continue;
		}
		manifests.push(decode_value(value, registry, document)?);
	}

	debug!(count = manifests.len(), "decoded manifests");
	Ok(manifests)
}

/// Decode one YAML document. `document` is its index, used in errors.
pub fn decode_value(value: Value, registry: &KindRegistry, document: usize) -> Result<Manifest> {
	let invalid = |reason: &str| MigrateError::ManifestInvalid {
		document,
		reason: reason.to_string(),
	};

	if !value.is_mapping() {
		return Err(invalid("document is not a mapping"));
	}
	let api_version = value
		.get("apiVersion")
		.and_then(Value::as_str)
		.ok_or_else(|| invalid("missing apiVersion"))?;
	let kind = value
		.get("kind")
		.and_then(Value::as_str)
		.ok_or_else(|| invalid("missing kind"))?;

	let typed = |source| MigrateError::ManifestDecode { document, source };
	let manifest = match registry.lookup(api_version, kind) {
		Some(ResourceKind::LegacyIngressRoute) => {
			Manifest::LegacyIngressRoute(serde_yaml::from_value(value).map_err(typed)?)
		}
		Some(ResourceKind::LegacyMiddleware) => {
			Manifest::LegacyMiddleware(serde_yaml::from_value(value).map_err(typed)?)
		}
		Some(ResourceKind::IngressRoute) => {
			Manifest::IngressRoute(serde_yaml::from_value(value).map_err(typed)?)
		}
		Some(ResourceKind::Middleware) => {
			Manifest::Middleware(serde_yaml::from_value(value).map_err(typed)?)
		}
		None => Manifest::Opaque(value),
	};
	Ok(manifest)
}

/// Encode one manifest as a YAML document, without creation timestamps.
pub fn encode_manifest(manifest: &Manifest) -> Result<String> {
	let encoded = match manifest {
		Manifest::Opaque(value) => {
			let mut value = value.clone();
			if let Some(metadata) = value.get_mut("metadata").and_then(Value::as_mapping_mut) {
				metadata.remove("creationTimestamp");
			}
			serde_yaml::to_string(&value)
		}
		typed => serde_yaml::to_string(typed),
	};
	encoded.map_err(|source| MigrateError::ManifestEncode { source })
}

/// Encode manifests as one stream, documents separated by `---`.
pub fn encode_manifests(manifests: &[Manifest]) -> Result<String> {
	let documents = manifests
		.iter()
		.map(encode_manifest)
		.collect::<Result<Vec<_>>>()?;
	Ok(documents.join(DOCUMENT_SEPARATOR))
}

#[cfg(test)]
mod tests {
	use super::*;

	const INPUT: &str = r#"
apiVersion: traefik.containo.us/v1alpha1
kind: IngressRoute
metadata:
  name: web
  namespace: apps
  creationTimestamp: "2023-01-01T00:00:00Z"
spec:
  entryPoints: [websecure]
  routes:
    - match: Host(`example.com`)
      kind: Rule
      priority: 10
      services:
        - name: web
          port: 80
---
---
apiVersion: v1
kind: Service
metadata:
  name: web
  creationTimestamp: null
spec:
  ports:
    - port: 80
"#;

	#[test]
	fn test_decode_typed_and_opaque_documents() {
		let manifests = decode_manifests(INPUT, &KindRegistry::traefik()).unwrap();
		assert_eq!(manifests.len(), 2);

		let Manifest::LegacyIngressRoute(route) = &manifests[0] else {
			panic!("Expected a v2 IngressRoute, got {:?}", manifests[0]);
		};
		assert_eq!(route.metadata.name, "web");
		assert_eq!(route.metadata.namespace.as_deref(), Some("apps"));
		assert_eq!(route.spec.entry_points, vec!["websecure"]);
		assert_eq!(route.spec.routes[0].rule, "Host(`example.com`)");
		assert_eq!(route.spec.routes[0].priority, 10);

		assert!(matches!(manifests[1], Manifest::Opaque(_)));
		assert_eq!(manifests[1].kind(), "Service");
		assert_eq!(manifests[1].name(), "web");
		assert_eq!(manifests[1].namespace(), "default");
	}

	#[test]
	fn test_unregistered_kinds_are_opaque() {
		let manifests = decode_manifests(INPUT, &KindRegistry::new()).unwrap();
		assert!(manifests.iter().all(|m| matches!(m, Manifest::Opaque(_))));
	}

	#[test]
	fn test_encode_drops_creation_timestamp() {
		let manifests = decode_manifests(INPUT, &KindRegistry::traefik()).unwrap();
		let encoded = encode_manifests(&manifests).unwrap();
		assert!(!encoded.contains("creationTimestamp"));
		assert_eq!(encoded.matches(DOCUMENT_SEPARATOR).count(), 1);

		let decoded = decode_manifests(&encoded, &KindRegistry::traefik()).unwrap();
		assert_eq!(decoded[0], manifests[0]);
	}

	#[test]
	fn test_encode_omits_unset_fields() {
		let manifests = decode_manifests(INPUT, &KindRegistry::traefik()).unwrap();
		let encoded = encode_manifest(&manifests[0]).unwrap();
		assert!(!encoded.contains("tls"));
		assert!(!encoded.contains("middlewares"));
		assert!(!encoded.contains("labels"));
	}

	#[test]
	fn test_decode_malformed_document() {
		let input = "kind: Service\napiVersion: v1\n---\nkey: [unclosed\n";
		match decode_manifests(input, &KindRegistry::traefik()).unwrap_err() {
			MigrateError::ManifestDecode { document, .. } => assert_eq!(document, 1),
			other => panic!("Expected ManifestDecode error, got {other:?}"),
		}
	}

	#[test]
	fn test_decode_missing_kind() {
		let input = "apiVersion: v1\nmetadata:\n  name: x\n";
		match decode_manifests(input, &KindRegistry::traefik()).unwrap_err() {
			MigrateError::ManifestInvalid { document, reason } => {
				assert_eq!(document, 0);
				assert_eq!(reason, "missing kind");
			}
			other => panic!("Expected ManifestInvalid error, got {other:?}"),
		}
	}

	#[test]
	fn test_decode_typed_field_error() {
		let input = "apiVersion: traefik.containo.us/v1alpha1\nkind: IngressRoute\nspec:\n  routes: 5\n";
		assert!(matches!(
			decode_manifests(input, &KindRegistry::traefik()).unwrap_err(),
			MigrateError::ManifestDecode { document: 0, .. }
		));
	}
}
