use serde::Deserialize;
use std::path::PathBuf;

/// Top-level configuration from a `.traefik-migrate.toml` file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
	/// If true, stop directory cascade and jump directly to ~/.traefik-migrate.toml.
	#[serde(default)]
	pub root: bool,

	/// Environment variable name that, if truthy, skips ~/.traefik-migrate.toml lookup.
	/// Useful for CI environments.
	#[serde(default)]
	pub root_config_lookup_disable_env_var: Option<String>,

	/// Extra annotation keys to drop from converted objects.
	#[serde(default)]
	pub skip_annotations: Vec<String>,

	/// Keep v2 rules verbatim and tag routes with `syntax: v2`.
	#[serde(default)]
	pub keep_syntax: Option<bool>,

	/// Skip middlewares that still configure options removed in v3 during `migrate`.
	#[serde(default)]
	pub skip_deprecated: Option<bool>,
}

/// A loaded configuration with its source path for debugging/display.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
	/// The parsed configuration.
	pub config: Config,

	/// The path this config was loaded from.
	pub path: PathBuf,
}

/// Merged configuration from multiple config files in the cascade.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedConfig {
	/// Union of every `skip-annotations` list, in cascade order.
	pub skip_annotations: Vec<String>,

	pub keep_syntax: bool,

	pub skip_deprecated: bool,

	/// Files that contributed, most specific first.
	pub sources: Vec<PathBuf>,
}

impl Config {
	/// Validate values serde cannot check.
	pub fn validate(&self, path: &std::path::Path) -> Result<(), crate::error::MigrateError> {
		if let Some(key) = self.skip_annotations.iter().find(|key| key.trim().is_empty()) {
			return Err(crate::error::MigrateError::InvalidConfigValue {
				path: path.to_path_buf(),
				key: "skip-annotations".to_string(),
				value: key.clone(),
			});
		}

		if let Some(var) = self
			.root_config_lookup_disable_env_var
			.as_ref()
			.filter(|var| var.is_empty() || var.contains('='))
		{
			return Err(crate::error::MigrateError::InvalidConfigValue {
				path: path.to_path_buf(),
				key: "root-config-lookup-disable-env-var".to_string(),
				value: var.clone(),
			});
		}

		Ok(())
	}
}
