//! Traefik v3 resources (`traefik.io/v1alpha1`).

use crate::resource::common::{
	Domain, IpStrategy, MiddlewareRef, ObjectMeta, ObjectRef, Port, ResponseForwarding, is_zero,
};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressRoute {
	pub api_version: String,
	pub kind: String,
	#[serde(default)]
	pub metadata: ObjectMeta,
	#[serde(default)]
	pub spec: IngressRouteSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressRouteSpec {
	#[serde(default)]
	pub routes: Vec<Route>,

	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub entry_points: Vec<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tls: Option<Tls>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
	#[serde(rename = "match")]
	pub rule: String,

	#[serde(default)]
	pub kind: String,

	#[serde(default, skip_serializing_if = "is_zero")]
	pub priority: i64,

	/// Rule syntax the router should parse `match` with; unset means v3.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub syntax: Option<String>,

	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub services: Vec<Service>,

	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub middlewares: Vec<MiddlewareRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
	pub name: String,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub namespace: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub kind: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub port: Option<Port>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scheme: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub strategy: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pass_host_header: Option<bool>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub response_forwarding: Option<ResponseForwarding>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub servers_transport: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub weight: Option<i64>,

	#[serde(rename = "nativeLB", default, skip_serializing_if = "Option::is_none")]
	pub native_lb: Option<bool>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sticky: Option<Sticky>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sticky {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cookie: Option<Cookie>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub secure: Option<bool>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub http_only: Option<bool>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub same_site: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_age: Option<i64>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub path: Option<String>,
}

impl Cookie {
	pub fn is_unset(&self) -> bool {
		self == &Cookie::default()
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tls {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub secret_name: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub options: Option<ObjectRef>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub store: Option<ObjectRef>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cert_resolver: Option<String>,

	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub domains: Vec<Domain>,
}

impl Tls {
	pub fn is_unset(&self) -> bool {
		self == &Tls::default()
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Middleware {
	pub api_version: String,
	pub kind: String,
	#[serde(default)]
	pub metadata: ObjectMeta,
	#[serde(default)]
	pub spec: MiddlewareSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiddlewareSpec {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub headers: Option<Headers>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub strip_prefix: Option<StripPrefix>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub content_type: Option<ContentType>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ip_allow_list: Option<IpAllowList>,

	#[serde(flatten)]
	pub other: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Headers {
	#[serde(flatten)]
	pub settings: BTreeMap<String, Value>,
}

impl Headers {
	pub fn is_unset(&self) -> bool {
		self == &Headers::default()
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StripPrefix {
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub prefixes: Vec<String>,
}

impl StripPrefix {
	pub fn is_unset(&self) -> bool {
		self == &StripPrefix::default()
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentType {
	#[serde(flatten)]
	pub settings: BTreeMap<String, Value>,
}

impl ContentType {
	pub fn is_unset(&self) -> bool {
		self == &ContentType::default()
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpAllowList {
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub source_range: Vec<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ip_strategy: Option<IpStrategy>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub reject_status_code: Option<i64>,
}
