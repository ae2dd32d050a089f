use crate::config::parser::parse_config_file;
use crate::config::types::{LoadedConfig, MergedConfig};
use crate::error::{MigrateError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the config file looked up in every directory of the cascade.
pub const CONFIG_FILE_NAME: &str = ".traefik-migrate.toml";

/// Load every `.traefik-migrate.toml` from `start_dir` up to the filesystem root.
///
/// A file with `root = true` ends the walk. The user's config in the home
/// directory comes last unless an opt-out variable named by a loaded file
/// is truthy. Configs are returned most specific first.
pub fn discover_configs(start_dir: &Path) -> Result<Vec<LoadedConfig>> {
	let mut configs = Vec::new();

	for dir in start_dir.ancestors() {
		let path = dir.join(CONFIG_FILE_NAME);
		if !path.is_file() {
			continue;
		}

		let config = parse_config_file(&path)?;
		debug!(path = %path.display(), root = config.root, "loaded config");
		let root = config.root;
		configs.push(LoadedConfig { config, path });
		if root {
			break;
		}
	}

	if let Some(user_config) = load_user_config(&configs)? {
		configs.push(user_config);
	}

	Ok(configs)
}

/// Load the user's ~/.traefik-migrate.toml if it exists and isn't disabled.
fn load_user_config(existing_configs: &[LoadedConfig]) -> Result<Option<LoadedConfig>> {
	for loaded in existing_configs {
		if let Some(ref env_var) = loaded.config.root_config_lookup_disable_env_var
			&& is_env_truthy(env_var)
		{
			debug!(env_var, "user config lookup disabled");
			return Ok(None);
		}
	}

	let user_config_path = user_config_path()?;

	// The walk may already have reached the home directory.
	if existing_configs
		.iter()
		.any(|loaded| loaded.path == user_config_path)
	{
		return Ok(None);
	}

	if user_config_path.exists() {
		let config = parse_config_file(&user_config_path)?;
		Ok(Some(LoadedConfig {
			config,
			path: user_config_path,
		}))
	} else {
		Ok(None)
	}
}

/// Check if an environment variable is set to a truthy value.
fn is_env_truthy(var_name: &str) -> bool {
	std::env::var(var_name).is_ok_and(|value| {
		!value.is_empty() && !["0", "false", "no"].contains(&value.to_lowercase().as_str())
	})
}

/// Merge multiple configs into a single effective config.
///
/// Scalars come from the most specific file that sets them.
/// `skip-annotations` lists are unioned.
pub fn merge_configs(configs: &[LoadedConfig]) -> MergedConfig {
	let mut merged = MergedConfig::default();
	let mut keep_syntax = None;
	let mut skip_deprecated = None;

	for loaded in configs {
		for key in &loaded.config.skip_annotations {
			if !merged.skip_annotations.contains(key) {
				merged.skip_annotations.push(key.clone());
			}
		}

		keep_syntax = keep_syntax.or(loaded.config.keep_syntax);
		skip_deprecated = skip_deprecated.or(loaded.config.skip_deprecated);
		merged.sources.push(loaded.path.clone());
	}

	merged.keep_syntax = keep_syntax.unwrap_or(false);
	merged.skip_deprecated = skip_deprecated.unwrap_or(false);
	merged
}

/// Convenience function to discover, load, and merge configs from a directory.
pub fn load_merged_config(start_dir: &Path) -> Result<MergedConfig> {
	let configs = discover_configs(start_dir)?;
	Ok(merge_configs(&configs))
}

/// Get the path to the user's config file.
pub fn user_config_path() -> Result<PathBuf> {
	let home_dir = dirs::home_dir().ok_or(MigrateError::HomeDirectoryNotFound)?;
	Ok(home_dir.join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::types::Config;
	use std::fs;

	fn loaded(path: &str, config: Config) -> LoadedConfig {
		LoadedConfig {
			config,
			path: PathBuf::from(path),
		}
	}

	#[test]
	fn test_is_env_truthy() {
		let cases = [
			("", false),
			("0", false),
			("FALSE", false),
			("no", false),
			("1", true),
			("yes", true),
			("on", true),
		];

		// SAFETY: single-threaded test context, variable unique to this test
		unsafe {
			std::env::remove_var("TEST_TRAEFIK_MIGRATE_TRUTHY");
			assert!(!is_env_truthy("TEST_TRAEFIK_MIGRATE_TRUTHY"));

			for (value, expected) in cases {
				std::env::set_var("TEST_TRAEFIK_MIGRATE_TRUTHY", value);
				assert_eq!(is_env_truthy("TEST_TRAEFIK_MIGRATE_TRUTHY"), expected, "{value:?}");
			}
			std::env::remove_var("TEST_TRAEFIK_MIGRATE_TRUTHY");
		}
	}

	#[test]
	fn test_merge_most_specific_scalar_wins() {
		let configs = [
			loaded(
				"/work/app/.traefik-migrate.toml",
				Config {
					keep_syntax: Some(true),
					..Config::default()
				},
			),
			loaded(
				"/work/.traefik-migrate.toml",
				Config {
					keep_syntax: Some(false),
					skip_deprecated: Some(true),
					..Config::default()
				},
			),
		];

		let merged = merge_configs(&configs);
		assert!(merged.keep_syntax);
		assert!(merged.skip_deprecated);
		assert_eq!(merged.sources.len(), 2);
		assert_eq!(
			merged.sources[0],
			PathBuf::from("/work/app/.traefik-migrate.toml")
		);
	}

	#[test]
	fn test_merge_unions_skip_annotations() {
		let configs = [
			loaded(
				"/a/.traefik-migrate.toml",
				Config {
					skip_annotations: vec!["a".to_string(), "b".to_string()],
					..Config::default()
				},
			),
			loaded(
				"/.traefik-migrate.toml",
				Config {
					skip_annotations: vec!["b".to_string(), "c".to_string()],
					..Config::default()
				},
			),
		];

		let merged = merge_configs(&configs);
		assert_eq!(merged.skip_annotations, vec!["a", "b", "c"]);
	}

	#[test]
	fn test_merge_empty_uses_defaults() {
		let merged = merge_configs(&[]);
		assert_eq!(merged, MergedConfig::default());
	}

	#[test]
	fn test_discover_stops_at_root() {
		let temp_dir = tempfile::tempdir().unwrap();
		let project = temp_dir.path().join("project");
		let nested = project.join("deploy");
		fs::create_dir_all(&nested).unwrap();

		fs::write(
			temp_dir.path().join(CONFIG_FILE_NAME),
			"skip-annotations = [\"outer\"]\n",
		)
		.unwrap();
		fs::write(
			project.join(CONFIG_FILE_NAME),
			"root = true\nroot-config-lookup-disable-env-var = \"TEST_TRAEFIK_MIGRATE_NO_USER\"\nskip-annotations = [\"project\"]\n",
		)
		.unwrap();
		fs::write(nested.join(CONFIG_FILE_NAME), "keep-syntax = true\n").unwrap();

		// SAFETY: single-threaded test context, variable unique to this test
		unsafe {
			std::env::set_var("TEST_TRAEFIK_MIGRATE_NO_USER", "1");
		}
		let configs = discover_configs(&nested).unwrap();
		unsafe {
			std::env::remove_var("TEST_TRAEFIK_MIGRATE_NO_USER");
		}

		let paths: Vec<_> = configs.iter().map(|c| c.path.clone()).collect();
		assert_eq!(
			paths,
			vec![nested.join(CONFIG_FILE_NAME), project.join(CONFIG_FILE_NAME)]
		);

		let merged = merge_configs(&configs);
		assert!(merged.keep_syntax);
		assert_eq!(merged.skip_annotations, vec!["project"]);
	}

	#[test]
	fn test_discover_reports_invalid_file() {
		let temp_dir = tempfile::tempdir().unwrap();
		fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "root = [").unwrap();

		assert!(matches!(
			discover_configs(temp_dir.path()),
			Err(MigrateError::ConfigParseError { .. })
		));
	}

	#[test]
	fn test_user_config_path() {
		let path = user_config_path();
		assert!(path.is_ok());
		let path = path.unwrap();
		assert!(path.ends_with(CONFIG_FILE_NAME));
	}
}
