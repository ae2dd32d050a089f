//! traefik-migrate - CLI tool for migrating Traefik v2 resources to v3.
//!
//! This library provides the core functionality for traefik-migrate, including:
//! - Match rule parsing, validation and v2 to v3 rewriting
//! - Typed v2/v3 `IngressRoute` and `Middleware` resources with YAML codecs
//! - Conversion of whole manifest streams with per-resource failure isolation
//! - Migration of stored resources through a pluggable store
//! - Configuration file parsing and cascade discovery
//!
//! # Example
//!
//! ```no_run
//! use traefik_migrate::convert::{ConvertOptions, Converter};
//! use traefik_migrate::resource::{KindRegistry, decode_manifests, encode_manifests};
//!
//! # fn main() -> traefik_migrate::Result<()> {
//! let input = std::fs::read_to_string("routes.yaml").unwrap();
//! let registry = KindRegistry::traefik();
//! let manifests = decode_manifests(&input, &registry)?;
//!
//! let converter = Converter::new(&ConvertOptions::default())?;
//! let report = converter.convert_all(&manifests);
//!
//! print!("{}", encode_manifests(&report.converted)?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod convert;
pub mod error;
pub mod migration;
pub mod resource;
pub mod rules;

pub use error::{MigrateError, Result};
