//! Shapes shared verbatim by the v2 and v3 schemas.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The subset of Kubernetes object metadata carried through a migration.
///
/// Server-populated fields such as `creationTimestamp`, `uid` or
/// `resourceVersion` are not modelled and are dropped on decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
	#[serde(default)]
	pub name: String,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub namespace: Option<String>,

	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub labels: BTreeMap<String, String>,

	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub annotations: BTreeMap<String, String>,
}

/// Reference to a middleware from a route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiddlewareRef {
	pub name: String,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub namespace: Option<String>,
}

/// Reference to a `TLSOption` or `TLSStore` object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRef {
	pub name: String,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub namespace: Option<String>,
}

/// A certificate domain: main name plus subject alternative names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub main: Option<String>,

	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub sans: Vec<String>,
}

/// A Kubernetes `IntOrString` service port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Port {
	Number(i64),
	Name(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseForwarding {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub flush_interval: Option<String>,
}

/// Client IP extraction strategy of an IP allow list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpStrategy {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub depth: Option<i64>,

	#[serde(rename = "excludedIPs", default, skip_serializing_if = "Vec::is_empty")]
	pub excluded_ips: Vec<String>,
}

impl IpStrategy {
	pub fn is_unset(&self) -> bool {
		self.depth.unwrap_or(0) == 0 && self.excluded_ips.is_empty()
	}
}

pub(crate) fn is_zero(value: &i64) -> bool {
	*value == 0
}
