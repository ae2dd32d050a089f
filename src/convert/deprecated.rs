//! Middleware options that exist in v2 but were removed in v3.

use crate::resource::legacy::MiddlewareSpec;
use std::fmt;

/// A v2 middleware option with no v3 equivalent.
pub struct RemovedOption {
	/// Middleware block, as spelled in the manifest.
	pub middleware: &'static str,
	pub option: &'static str,
	configured: fn(&MiddlewareSpec) -> bool,
}

impl RemovedOption {
	pub fn is_configured(&self, spec: &MiddlewareSpec) -> bool {
		(self.configured)(spec)
	}
}

impl fmt::Display for RemovedOption {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}", self.middleware, self.option)
	}
}

impl fmt::Debug for RemovedOption {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "RemovedOption({self})")
	}
}

/// An option counts as configured when it is `true`, a non-empty string or a positive integer.
trait Configured {
	fn is_configured(&self) -> bool;
}

impl Configured for bool {
	fn is_configured(&self) -> bool {
		*self
	}
}

impl Configured for String {
	fn is_configured(&self) -> bool {
		!self.is_empty()
	}
}

impl Configured for i64 {
	fn is_configured(&self) -> bool {
		*self > 0
	}
}

impl<T: Configured> Configured for Option<T> {
	fn is_configured(&self) -> bool {
		self.as_ref().is_some_and(T::is_configured)
	}
}

pub const REMOVED_OPTIONS: &[RemovedOption] = &[
	RemovedOption {
		middleware: "headers",
		option: "sslRedirect",
		configured: |spec| {
			spec.headers
				.as_ref()
				.is_some_and(|headers| headers.ssl_redirect.is_configured())
		},
	},
	RemovedOption {
		middleware: "headers",
		option: "sslTemporaryRedirect",
		configured: |spec| {
			spec.headers
				.as_ref()
				.is_some_and(|headers| headers.ssl_temporary_redirect.is_configured())
		},
	},
	RemovedOption {
		middleware: "headers",
		option: "sslHost",
		configured: |spec| {
			spec.headers
				.as_ref()
				.is_some_and(|headers| headers.ssl_host.is_configured())
		},
	},
	RemovedOption {
		middleware: "headers",
		option: "sslForceHost",
		configured: |spec| {
			spec.headers
				.as_ref()
				.is_some_and(|headers| headers.ssl_force_host.is_configured())
		},
	},
	RemovedOption {
		middleware: "headers",
		option: "featurePolicy",
		configured: |spec| {
			spec.headers
				.as_ref()
				.is_some_and(|headers| headers.feature_policy.is_configured())
		},
	},
	RemovedOption {
		middleware: "stripPrefix",
		option: "forceSlash",
		configured: |spec| {
			spec.strip_prefix
				.as_ref()
				.is_some_and(|strip_prefix| strip_prefix.force_slash.is_configured())
		},
	},
	RemovedOption {
		middleware: "contentType",
		option: "autoDetect",
		configured: |spec| {
			spec.content_type
				.as_ref()
				.is_some_and(|content_type| content_type.auto_detect.is_configured())
		},
	},
];

/// Removed options `spec` still configures, in table order.
pub fn configured_removed_options(spec: &MiddlewareSpec) -> Vec<&'static RemovedOption> {
	REMOVED_OPTIONS
		.iter()
		.filter(|option| option.is_configured(spec))
		.collect()
}

pub fn has_removed_options(spec: &MiddlewareSpec) -> bool {
	REMOVED_OPTIONS.iter().any(|option| option.is_configured(spec))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::resource::legacy::{ContentType, Headers, StripPrefix};

	#[test]
	fn test_configured_values() {
		assert!(true.is_configured());
		assert!(!false.is_configured());
		assert!("x".to_string().is_configured());
		assert!(!String::new().is_configured());
		assert!(3i64.is_configured());
		assert!(!0i64.is_configured());
		assert!(!(-1i64).is_configured());
		assert!(!None::<bool>.is_configured());
		assert!(Some(true).is_configured());
	}

	#[test]
	fn test_clean_spec_has_no_removed_options() {
		let spec = MiddlewareSpec {
			headers: Some(Headers::default()),
			strip_prefix: Some(StripPrefix {
				prefixes: vec!["/api".to_string()],
				force_slash: Some(false),
			}),
			..MiddlewareSpec::default()
		};
		assert!(!has_removed_options(&spec));
		assert!(configured_removed_options(&spec).is_empty());
	}

	#[test]
	fn test_detects_removed_options() {
		let spec = MiddlewareSpec {
			headers: Some(Headers {
				ssl_redirect: Some(true),
				ssl_host: Some(String::new()),
				feature_policy: Some("camera 'none'".to_string()),
				..Headers::default()
			}),
			content_type: Some(ContentType {
				auto_detect: Some(true),
				..ContentType::default()
			}),
			..MiddlewareSpec::default()
		};

		assert!(has_removed_options(&spec));
		let names: Vec<String> = configured_removed_options(&spec)
			.iter()
			.map(|option| option.to_string())
			.collect();
		assert_eq!(
			names,
			vec![
				"headers.sslRedirect",
				"headers.featurePolicy",
				"contentType.autoDetect"
			]
		);
	}

	#[test]
	fn test_force_slash() {
		let spec = MiddlewareSpec {
			strip_prefix: Some(StripPrefix {
				prefixes: Vec::new(),
				force_slash: Some(true),
			}),
			..MiddlewareSpec::default()
		};
		assert_eq!(configured_removed_options(&spec)[0].option, "forceSlash");
	}
}
