use crate::rules::grammar::RuleParseError;
use crate::rules::validator::Syntax;
use std::path::PathBuf;

/// Library-level structured errors for traefik-migrate.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
	#[error("Failed to read config file: {path}")]
	ConfigReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid value for `{key}` in config file {path}: {value:?}")]
	InvalidConfigValue {
		path: PathBuf,
		key: String,
		value: String,
	},

	#[error("Failed to resolve home directory")]
	HomeDirectoryNotFound,

	#[error("Failed to decode manifest document #{document}")]
	ManifestDecode {
		document: usize,
		#[source]
		source: serde_yaml::Error,
	},

	#[error("Manifest document #{document} is invalid: {reason}")]
	ManifestInvalid { document: usize, reason: String },

	#[error("Failed to encode manifest")]
	ManifestEncode {
		#[source]
		source: serde_yaml::Error,
	},

	#[error("Unbalanced braces in template {template:?}")]
	UnbalancedBraces { template: String },

	#[error("Missing name or pattern in placeholder {placeholder:?}")]
	MissingPlaceholderPart { placeholder: String },

	#[error("Invalid regex pattern compiled from template: {pattern}")]
	InvalidPattern {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error(
		"Template {template:?} compiled to {found} capture groups but has {expected} placeholders; \
		 only non-capturing groups are accepted, e.g. (?:pattern) instead of (pattern)"
	)]
	CaptureGroupMismatch {
		template: String,
		expected: usize,
		found: usize,
	},

	#[error("Rule rejected under {syntax} syntax: {rule}")]
	RuleRejected {
		rule: String,
		syntax: Syntax,
		#[source]
		source: RuleParseError,
	},

	#[error("Unknown rule syntax version: {value}")]
	UnknownSyntax { value: String },

	#[error("Failed to convert {kind} {namespace}/{name}")]
	Resource {
		kind: String,
		namespace: String,
		name: String,
		#[source]
		source: Box<MigrateError>,
	},

	#[error("Converter for {expected} received a {found} document")]
	KindMismatch { expected: String, found: String },

	#[error("{kind} {namespace}/{name} not found in store")]
	StoreNotFound {
		kind: String,
		namespace: String,
		name: String,
	},

	#[error("Invalid object {field} {value:?}: expected a lowercase RFC 1123 name")]
	InvalidObjectName { field: &'static str, value: String },

	#[error("Cannot store object of unregistered kind {kind} ({api_version})")]
	UnregisteredKind { api_version: String, kind: String },

	#[error("Failed to read from store: {path}")]
	StoreRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to write to store: {path}")]
	StoreWrite {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to decode stored object: {path}")]
	StoreDecode {
		path: PathBuf,
		#[source]
		source: Box<MigrateError>,
	},
}

impl MigrateError {
	/// True for errors that signal a defect in pattern compilation rather than bad input.
	pub fn is_invariant_violation(&self) -> bool {
		match self {
			MigrateError::CaptureGroupMismatch { .. } => true,
			MigrateError::Resource { source, .. } => source.is_invariant_violation(),
			_ => false,
		}
	}

	/// True for errors caused by a malformed match rule or template.
	pub fn is_rule_syntax(&self) -> bool {
		match self {
			MigrateError::UnbalancedBraces { .. }
			| MigrateError::MissingPlaceholderPart { .. }
			| MigrateError::InvalidPattern { .. }
			| MigrateError::RuleRejected { .. } => true,
			MigrateError::Resource { source, .. } => source.is_rule_syntax(),
			_ => false,
		}
	}
}

/// Result type alias using MigrateError.
pub type Result<T> = std::result::Result<T, MigrateError>;
