//! OpenShift Route resource
//!
//! Only the fields the controller reads or writes are typed. Everything
//! else (`tls`, `port`, `wildcardPolicy`, `to.weight`, ...) is carried
//! through untouched so a replace never strips it.

use kube::CustomResource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// API group whose presence identifies an OpenShift cluster
pub const ROUTE_API_GROUP: &str = "route.openshift.io";

#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[kube(
    group = "route.openshift.io",
    version = "v1",
    kind = "Route",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    /// Externally visible hostname
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Service the route points at
    pub to: RouteTargetReference,

    /// Fields the controller does not manage
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteTargetReference {
    pub kind: String,
    pub name: String,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl RouteTargetReference {
    pub fn service(name: impl Into<String>) -> Self {
        Self {
            kind: "Service".to_string(),
            name: name.into(),
            extra: BTreeMap::new(),
        }
    }
}
