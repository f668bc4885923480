//! Cluster access for the controller
//!
//! Every read and write the controller performs goes through [`ClusterApi`].
//! Two implementations exist:
//! - **KubeCluster**: backed by a `kube::Client`
//! - **MockCluster**: in-memory, with operation counters for tests
//!
//! `get_*` methods return `Ok(None)` for missing objects; `delete_*` methods
//! return `Ok(false)` when there was nothing to delete.

mod kube_cluster;
mod mock;

pub use kube_cluster::KubeCluster;
pub use mock::{MockCluster, OperationCounts};

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Node, Service};
use k8s_openapi::api::networking::v1::Ingress;

use crate::error::Result;
use crate::route::Route;

/// Operations the controller needs from the cluster
///
/// Implementations must be Send + Sync so one handle can be shared by the
/// engine and every backend.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Whether the cluster serves OpenShift routes
    async fn is_openshift(&self) -> Result<bool>;

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>>;

    async fn list_nodes(&self) -> Result<Vec<Node>>;

    /// Write back a service (annotation and type changes)
    async fn replace_service(&self, service: &Service) -> Result<()>;

    async fn get_ingress(&self, namespace: &str, name: &str) -> Result<Option<Ingress>>;
    async fn create_ingress(&self, namespace: &str, ingress: &Ingress) -> Result<()>;
    async fn replace_ingress(&self, namespace: &str, ingress: &Ingress) -> Result<()>;
    async fn delete_ingress(&self, namespace: &str, name: &str) -> Result<bool>;

    async fn get_route(&self, namespace: &str, name: &str) -> Result<Option<Route>>;
    async fn create_route(&self, namespace: &str, route: &Route) -> Result<()>;
    async fn replace_route(&self, namespace: &str, route: &Route) -> Result<()>;
    async fn delete_route(&self, namespace: &str, name: &str) -> Result<bool>;
}
