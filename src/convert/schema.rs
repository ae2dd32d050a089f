//! Field-by-field mapping of v2 shapes onto their v3 counterparts.
//!
//! Fields the v3 shape lacks are dropped; fields the v2 shape lacks take
//! their default. Blocks left with every field unset are omitted.

use crate::resource::common::ObjectMeta;
use crate::resource::{current, legacy};
use std::collections::{BTreeMap, BTreeSet};

/// Annotation written by `kubectl apply`; it describes the v2 object and must not follow it.
pub const LAST_APPLIED_CONFIGURATION: &str = "kubectl.kubernetes.io/last-applied-configuration";

/// Drops denylisted annotations from converted objects.
#[derive(Debug, Clone)]
pub struct AnnotationFilter {
	skipped: BTreeSet<String>,
}

impl Default for AnnotationFilter {
	fn default() -> Self {
		Self::new(&[])
	}
}

impl AnnotationFilter {
	/// A filter skipping the `kubectl` annotation plus `extra` keys.
	pub fn new(extra: &[String]) -> Self {
		let mut skipped: BTreeSet<String> = extra.iter().cloned().collect();
		skipped.insert(LAST_APPLIED_CONFIGURATION.to_string());
		AnnotationFilter { skipped }
	}

	pub fn is_skipped(&self, key: &str) -> bool {
		self.skipped.contains(key)
	}

	pub fn filter(&self, annotations: &BTreeMap<String, String>) -> BTreeMap<String, String> {
		annotations
			.iter()
			.filter(|(key, _)| !self.is_skipped(key))
			.map(|(key, value)| (key.clone(), value.clone()))
			.collect()
	}

	/// Copy of `metadata` with skipped annotations removed.
	pub fn metadata(&self, metadata: &ObjectMeta) -> ObjectMeta {
		ObjectMeta {
			name: metadata.name.clone(),
			namespace: metadata.namespace.clone(),
			labels: metadata.labels.clone(),
			annotations: self.filter(&metadata.annotations),
		}
	}
}

impl From<&legacy::Service> for current::Service {
	fn from(service: &legacy::Service) -> Self {
		current::Service {
			name: service.name.clone(),
			namespace: service.namespace.clone(),
			kind: service.kind.clone(),
			port: service.port.clone(),
			scheme: service.scheme.clone(),
			strategy: service.strategy.clone(),
			pass_host_header: service.pass_host_header,
			response_forwarding: service
				.response_forwarding
				.clone()
				.filter(|forwarding| forwarding.flush_interval.is_some()),
			servers_transport: service.servers_transport.clone(),
			weight: service.weight,
			native_lb: service.native_lb,
			sticky: service
				.sticky
				.as_ref()
				.map(current::Sticky::from)
				.filter(|sticky| sticky.cookie.is_some()),
		}
	}
}

impl From<&legacy::Sticky> for current::Sticky {
	fn from(sticky: &legacy::Sticky) -> Self {
		current::Sticky {
			cookie: sticky
				.cookie
				.as_ref()
				.map(current::Cookie::from)
				.filter(|cookie| !cookie.is_unset()),
		}
	}
}

impl From<&legacy::Cookie> for current::Cookie {
	fn from(cookie: &legacy::Cookie) -> Self {
		current::Cookie {
			name: cookie.name.clone(),
			secure: cookie.secure,
			http_only: cookie.http_only,
			same_site: cookie.same_site.clone(),
			..current::Cookie::default()
		}
	}
}

impl From<&legacy::Tls> for current::Tls {
	fn from(tls: &legacy::Tls) -> Self {
		current::Tls {
			secret_name: non_empty(&tls.secret_name),
			options: tls.options.clone(),
			store: tls.store.clone(),
			cert_resolver: non_empty(&tls.cert_resolver),
			domains: tls.domains.clone(),
		}
	}
}

fn non_empty(value: &Option<String>) -> Option<String> {
	value.clone().filter(|value| !value.is_empty())
}

impl From<&legacy::MiddlewareSpec> for current::MiddlewareSpec {
	fn from(spec: &legacy::MiddlewareSpec) -> Self {
		// Late v2 releases accept both names; the v3 one takes precedence.
		let allow_list = spec.ip_allow_list.as_ref().or(spec.ip_white_list.as_ref());

		current::MiddlewareSpec {
			headers: spec
				.headers
				.as_ref()
				.map(|headers| current::Headers {
					settings: headers.settings.clone(),
				})
				.filter(|headers| !headers.is_unset()),
			strip_prefix: spec
				.strip_prefix
				.as_ref()
				.map(|strip_prefix| current::StripPrefix {
					prefixes: strip_prefix.prefixes.clone(),
				})
				.filter(|strip_prefix| !strip_prefix.is_unset()),
			content_type: spec
				.content_type
				.as_ref()
				.map(|content_type| current::ContentType {
					settings: content_type.settings.clone(),
				})
				.filter(|content_type| !content_type.is_unset()),
			ip_allow_list: allow_list.map(current::IpAllowList::from),
			other: spec.other.clone(),
		}
	}
}

impl From<&legacy::IpWhiteList> for current::IpAllowList {
	fn from(list: &legacy::IpWhiteList) -> Self {
		current::IpAllowList {
			source_range: list.source_range.clone(),
			ip_strategy: list
				.ip_strategy
				.clone()
				.filter(|strategy| !strategy.is_unset()),
			reject_status_code: None,
		}
	}
}
