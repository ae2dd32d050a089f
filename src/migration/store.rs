use crate::error::{MigrateError, Result};
use crate::resource::{KindRegistry, Manifest, ResourceKind, decode_manifests, encode_manifest};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Result of a create request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
	Created,
	AlreadyExists,
}

/// Where resources are read from and written to.
pub trait ResourceStore {
	fn get(&self, kind: ResourceKind, namespace: &str, name: &str) -> Result<Manifest>;

	/// Every object of `kind`, in one namespace or across all of them when `namespace` is `None`.
	fn list(&self, kind: ResourceKind, namespace: Option<&str>) -> Result<Vec<Manifest>>;

	/// Store a new object. Existing objects are never overwritten; with
	/// `dry_run` nothing is written.
	fn create(&self, manifest: &Manifest, dry_run: bool) -> Result<CreateOutcome>;
}

/// A store keeping one YAML file per object under
/// `<root>/<group>/<kind>/<namespace>/<name>.yaml`.
#[derive(Debug, Clone)]
pub struct DirectoryStore<'a> {
	root: PathBuf,
	registry: &'a KindRegistry,
}

impl<'a> DirectoryStore<'a> {
	pub fn new(root: impl Into<PathBuf>, registry: &'a KindRegistry) -> Self {
		DirectoryStore {
			root: root.into(),
			registry,
		}
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	fn kind_dir(&self, kind: ResourceKind) -> PathBuf {
		self.root.join(kind.group()).join(kind.kind())
	}

	fn namespace_dir(&self, kind: ResourceKind, namespace: &str) -> Result<PathBuf> {
		check_name("namespace", namespace, MAX_LABEL_LENGTH, false)?;
		Ok(self.kind_dir(kind).join(namespace))
	}

	fn object_path(&self, kind: ResourceKind, namespace: &str, name: &str) -> Result<PathBuf> {
		check_name("name", name, MAX_SUBDOMAIN_LENGTH, true)?;
		Ok(self.namespace_dir(kind, namespace)?.join(format!("{name}.yaml")))
	}

	fn read(&self, path: &Path) -> Result<Manifest> {
		let content = fs::read_to_string(path).map_err(|source| MigrateError::StoreRead {
			path: path.to_path_buf(),
			source,
		})?;

		let decode_error = |source| MigrateError::StoreDecode {
			path: path.to_path_buf(),
			source: Box::new(source),
		};
		decode_manifests(&content, self.registry)
			.map_err(decode_error)?
			.into_iter()
			.next()
			.ok_or_else(|| {
				decode_error(MigrateError::ManifestInvalid {
					document: 0,
					reason: "empty document".to_string(),
				})
			})
	}
}

const MAX_LABEL_LENGTH: usize = 63;
const MAX_SUBDOMAIN_LENGTH: usize = 253;

/// Accept RFC 1123 labels, or dot-separated labels when `dotted`.
///
/// Names become path components, so anything else is rejected before a path is built.
fn check_name(field: &'static str, value: &str, max_len: usize, dotted: bool) -> Result<()> {
	let is_label = |label: &str| {
		let bytes = label.as_bytes();
		!bytes.is_empty()
			&& bytes.len() <= MAX_LABEL_LENGTH
			&& bytes[0].is_ascii_alphanumeric()
			&& bytes[bytes.len() - 1].is_ascii_alphanumeric()
			&& bytes
				.iter()
				.all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
	};

	let valid = value.len() <= max_len
		&& if dotted {
			value.split('.').all(is_label)
		} else {
			is_label(value)
		};
	if !valid {
		return Err(MigrateError::InvalidObjectName {
			field,
			value: value.to_string(),
		});
	}
	Ok(())
}

/// Entries of `dir`, sorted by name; a missing directory has none.
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
	let entries = match fs::read_dir(dir) {
		Ok(entries) => entries,
		Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
		Err(source) => {
			return Err(MigrateError::StoreRead {
				path: dir.to_path_buf(),
				source,
			});
		}
	};

	let mut paths = entries
		.map(|entry| entry.map(|entry| entry.path()))
		.collect::<std::io::Result<Vec<_>>>()
		.map_err(|source| MigrateError::StoreRead {
			path: dir.to_path_buf(),
			source,
		})?;
	paths.sort();
	Ok(paths)
}

impl ResourceStore for DirectoryStore<'_> {
	fn get(&self, kind: ResourceKind, namespace: &str, name: &str) -> Result<Manifest> {
		let path = self.object_path(kind, namespace, name)?;
		if !path.is_file() {
			return Err(MigrateError::StoreNotFound {
				kind: kind.to_string(),
				namespace: namespace.to_string(),
				name: name.to_string(),
			});
		}
		self.read(&path)
	}

	fn list(&self, kind: ResourceKind, namespace: Option<&str>) -> Result<Vec<Manifest>> {
		let namespaces = match namespace {
			Some(namespace) => vec![self.namespace_dir(kind, namespace)?],
			None => sorted_entries(&self.kind_dir(kind))?
				.into_iter()
				.filter(|path| path.is_dir())
				.collect(),
		};

		let mut manifests = Vec::new();
		for dir in namespaces {
			for path in sorted_entries(&dir)? {
				if path.extension().is_some_and(|ext| ext == "yaml") {
					manifests.push(self.read(&path)?);
				}
			}
		}

		debug!(%kind, count = manifests.len(), "listed resources");
		Ok(manifests)
	}

	fn create(&self, manifest: &Manifest, dry_run: bool) -> Result<CreateOutcome> {
		let kind = manifest
			.resource_kind()
			.ok_or_else(|| MigrateError::UnregisteredKind {
				api_version: manifest.api_version().to_string(),
				kind: manifest.kind().to_string(),
			})?;

		let path = self.object_path(kind, manifest.namespace(), manifest.name())?;
		if path.exists() {
			return Ok(CreateOutcome::AlreadyExists);
		}
		if dry_run {
			return Ok(CreateOutcome::Created);
		}

		let content = encode_manifest(manifest)?;
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).map_err(|source| MigrateError::StoreWrite {
				path: parent.to_path_buf(),
				source,
			})?;
		}
		fs::write(&path, content).map_err(|source| MigrateError::StoreWrite {
			path: path.clone(),
			source,
		})?;

		debug!(path = %path.display(), "stored resource");
		Ok(CreateOutcome::Created)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const ROUTE: &str = r#"
apiVersion: traefik.containo.us/v1alpha1
kind: IngressRoute
metadata:
  name: web
  namespace: apps
spec:
  routes:
    - match: Host(`a.com`)
      kind: Rule
"#;

	fn route(registry: &KindRegistry) -> Manifest {
		decode_manifests(ROUTE, registry).unwrap().remove(0)
	}

	#[test]
	fn test_create_then_get() {
		let temp_dir = tempfile::tempdir().unwrap();
		let registry = KindRegistry::traefik();
		let store = DirectoryStore::new(temp_dir.path(), &registry);
		let manifest = route(&registry);

		assert_eq!(store.create(&manifest, false).unwrap(), CreateOutcome::Created);
		assert!(
			temp_dir
				.path()
				.join("traefik.containo.us/IngressRoute/apps/web.yaml")
				.is_file()
		);

		let stored = store
			.get(ResourceKind::LegacyIngressRoute, "apps", "web")
			.unwrap();
		assert_eq!(stored, manifest);
	}

	#[test]
	fn test_create_existing_is_reported() {
		let temp_dir = tempfile::tempdir().unwrap();
		let registry = KindRegistry::traefik();
		let store = DirectoryStore::new(temp_dir.path(), &registry);
		let manifest = route(&registry);

		store.create(&manifest, false).unwrap();
		assert_eq!(
			store.create(&manifest, false).unwrap(),
			CreateOutcome::AlreadyExists
		);
	}

	#[test]
	fn test_dry_run_writes_nothing() {
		let temp_dir = tempfile::tempdir().unwrap();
		let registry = KindRegistry::traefik();
		let store = DirectoryStore::new(temp_dir.path(), &registry);

		assert_eq!(
			store.create(&route(&registry), true).unwrap(),
			CreateOutcome::Created
		);
		assert!(fs::read_dir(temp_dir.path()).unwrap().next().is_none());
	}

	#[test]
	fn test_get_missing() {
		let temp_dir = tempfile::tempdir().unwrap();
		let registry = KindRegistry::traefik();
		let store = DirectoryStore::new(temp_dir.path(), &registry);

		assert!(matches!(
			store.get(ResourceKind::Middleware, "default", "nope"),
			Err(MigrateError::StoreNotFound { .. })
		));
	}

	#[test]
	fn test_list_across_namespaces() {
		let temp_dir = tempfile::tempdir().unwrap();
		let registry = KindRegistry::traefik();
		let store = DirectoryStore::new(temp_dir.path(), &registry);

		for (namespace, name) in [("b", "two"), ("a", "one"), ("a", "zero")] {
			let input = ROUTE
				.replace("name: web", &format!("name: {name}"))
				.replace("namespace: apps", &format!("namespace: {namespace}"));
			store
				.create(&decode_manifests(&input, &registry).unwrap()[0], false)
				.unwrap();
		}

		let all: Vec<String> = store
			.list(ResourceKind::LegacyIngressRoute, None)
			.unwrap()
			.iter()
			.map(|m| format!("{}/{}", m.namespace(), m.name()))
			.collect();
		assert_eq!(all, vec!["a/one", "a/zero", "b/two"]);

		assert_eq!(
			store
				.list(ResourceKind::LegacyIngressRoute, Some("b"))
				.unwrap()
				.len(),
			1
		);
		assert!(
			store
				.list(ResourceKind::LegacyMiddleware, None)
				.unwrap()
				.is_empty()
		);
	}

	#[test]
	fn test_corrupt_object() {
		let temp_dir = tempfile::tempdir().unwrap();
		let registry = KindRegistry::traefik();
		let store = DirectoryStore::new(temp_dir.path(), &registry);

		let dir = temp_dir.path().join("traefik.containo.us/Middleware/default");
		fs::create_dir_all(&dir).unwrap();
		fs::write(dir.join("broken.yaml"), "kind: [").unwrap();

		assert!(matches!(
			store.get(ResourceKind::LegacyMiddleware, "default", "broken"),
			Err(MigrateError::StoreDecode { .. })
		));
	}

	#[test]
	fn test_names_cannot_leave_the_store() {
		let temp_dir = tempfile::tempdir().unwrap();
		let root = temp_dir.path().join("store");
		let registry = KindRegistry::traefik();
		let store = DirectoryStore::new(&root, &registry);

		for (namespace, name) in [
			("apps", "../../../../escaped"),
			("apps", "nested/escaped"),
			("..", "escaped"),
			("apps", ""),
			("Apps", "web"),
			("apps", "web."),
		] {
			let input = ROUTE
				.replace("name: web", &format!("name: {name:?}"))
				.replace("namespace: apps", &format!("namespace: {namespace:?}"));
			let manifest = decode_manifests(&input, &registry).unwrap().remove(0);

			assert!(
				matches!(
					store.create(&manifest, false),
					Err(MigrateError::InvalidObjectName { .. })
				),
				"{namespace}/{name}"
			);
		}
		assert!(!temp_dir.path().join("escaped.yaml").exists());
		assert!(!root.exists());

		assert!(matches!(
			store.get(ResourceKind::LegacyIngressRoute, "apps", "../web"),
			Err(MigrateError::InvalidObjectName { field: "name", .. })
		));
		assert!(matches!(
			store.list(ResourceKind::LegacyIngressRoute, Some("../..")),
			Err(MigrateError::InvalidObjectName { field: "namespace", .. })
		));
	}

	#[test]
	fn test_dotted_names_are_accepted() {
		let temp_dir = tempfile::tempdir().unwrap();
		let registry = KindRegistry::traefik();
		let store = DirectoryStore::new(temp_dir.path(), &registry);
		let input = ROUTE.replace("name: web", "name: web.v2-api");

		let manifest = decode_manifests(&input, &registry).unwrap().remove(0);
		assert_eq!(store.create(&manifest, false).unwrap(), CreateOutcome::Created);
		assert!(
			store
				.get(ResourceKind::LegacyIngressRoute, "apps", "web.v2-api")
				.is_ok()
		);
	}

	#[test]
	fn test_opaque_manifests_cannot_be_stored() {
		let temp_dir = tempfile::tempdir().unwrap();
		let registry = KindRegistry::traefik();
		let store = DirectoryStore::new(temp_dir.path(), &registry);
		let manifest = Manifest::Opaque(
			serde_yaml::from_str("apiVersion: v1\nkind: Service\nmetadata:\n  name: web\n").unwrap(),
		);

		assert!(matches!(
			store.create(&manifest, false),
			Err(MigrateError::UnregisteredKind { .. })
		));
	}
}
