//! Mock cluster for testing
//!
//! Stores objects in memory so the engine and backends can be exercised
//! without a Kubernetes cluster. Every call is counted for assertions.

use async_trait::async_trait;
use expose_core::ServiceKey;
use k8s_openapi::api::core::v1::{ConfigMap, Node, Service};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::core::ErrorResponse;
use kube::{Resource, ResourceExt};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use super::ClusterApi;
use crate::error::{ExposeError, Result};
use crate::route::Route;

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationCounts {
    pub gets: usize,
    pub lists: usize,
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl OperationCounts {
    /// Total number of mutating calls
    pub fn writes(&self) -> usize {
        self.creates + self.updates + self.deletes
    }
}

#[derive(Default)]
struct State {
    openshift: bool,
    fail_writes: bool,
    config_maps: HashMap<ServiceKey, ConfigMap>,
    nodes: Vec<Node>,
    services: HashMap<ServiceKey, Service>,
    ingresses: HashMap<ServiceKey, Ingress>,
    routes: HashMap<ServiceKey, Route>,
    counts: OperationCounts,
}

/// In-memory cluster for testing
#[derive(Clone, Default)]
pub struct MockCluster {
    state: Arc<Mutex<State>>,
}

fn key_of<K: Resource>(obj: &K, namespace: Option<&str>) -> ServiceKey {
    ServiceKey::new(
        namespace
            .map(str::to_string)
            .or_else(|| obj.meta().namespace.clone())
            .unwrap_or_default(),
        obj.meta().name.clone().unwrap_or_default(),
    )
}

fn injected_failure() -> ExposeError {
    ExposeError::Api(kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: "injected write failure".to_string(),
        reason: "InternalError".to_string(),
        code: 500,
    }))
}

fn not_found(name: &str) -> ExposeError {
    ExposeError::Api(kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: format!("\"{name}\" not found"),
        reason: "NotFound".to_string(),
        code: 404,
    }))
}

fn already_exists(name: &str) -> ExposeError {
    ExposeError::Api(kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: format!("\"{name}\" already exists"),
        reason: "AlreadyExists".to_string(),
        code: 409,
    }))
}

impl MockCluster {
    /// Create a new empty plain-Kubernetes cluster
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Report the cluster as OpenShift
    pub fn with_openshift(self, openshift: bool) -> Self {
        self.state().openshift = openshift;
        self
    }

    /// Add a ConfigMap built from key/value pairs
    pub fn with_config_map(self, namespace: &str, name: &str, data: &[(&str, &str)]) -> Self {
        let config_map = ConfigMap {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            data: Some(
                data.iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<BTreeMap<_, _>>(),
            ),
            ..Default::default()
        };
        self.state()
            .config_maps
            .insert(ServiceKey::new(namespace, name), config_map);
        self
    }

    /// Add a node, optionally annotated with an external IP
    pub fn with_node(self, name: &str, external_ip: Option<&str>) -> Self {
        let annotations = external_ip.map(|ip| {
            BTreeMap::from([(
                expose_core::constants::EXTERNAL_IP_ANNOTATION.to_string(),
                ip.to_string(),
            )])
        });
        let node = Node {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                annotations,
                ..Default::default()
            },
            ..Default::default()
        };
        self.state().nodes.push(node);
        self
    }

    pub fn with_service(self, service: Service) -> Self {
        let key = key_of(&service, None);
        self.state().services.insert(key, service);
        self
    }

    pub fn with_ingress(self, ingress: Ingress) -> Self {
        let key = key_of(&ingress, None);
        self.state().ingresses.insert(key, ingress);
        self
    }

    pub fn with_route(self, route: Route) -> Self {
        let key = key_of(&route, None);
        self.state().routes.insert(key, route);
        self
    }

    /// Make every create/update/delete call fail
    pub fn fail_writes(&self, fail: bool) {
        self.state().fail_writes = fail;
    }

    /// Get a stored service
    pub fn service(&self, namespace: &str, name: &str) -> Option<Service> {
        self.state()
            .services
            .get(&ServiceKey::new(namespace, name))
            .cloned()
    }

    /// Get a stored ingress without counting the call
    pub fn ingress(&self, namespace: &str, name: &str) -> Option<Ingress> {
        self.state()
            .ingresses
            .get(&ServiceKey::new(namespace, name))
            .cloned()
    }

    /// Get a stored route without counting the call
    pub fn route(&self, namespace: &str, name: &str) -> Option<Route> {
        self.state()
            .routes
            .get(&ServiceKey::new(namespace, name))
            .cloned()
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.state().counts.clone()
    }

    /// Reset operation counts
    pub fn reset_counts(&self) {
        self.state().counts = OperationCounts::default();
    }

    /// Count a write, failing it when failure injection is on
    fn begin_write(state: &mut State, bump: fn(&mut OperationCounts)) -> Result<()> {
        bump(&mut state.counts);
        if state.fail_writes {
            return Err(injected_failure());
        }
        Ok(())
    }
}

#[async_trait]
impl ClusterApi for MockCluster {
    async fn is_openshift(&self) -> Result<bool> {
        Ok(self.state().openshift)
    }

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>> {
        let mut state = self.state();
        state.counts.gets += 1;
        Ok(state
            .config_maps
            .get(&ServiceKey::new(namespace, name))
            .cloned())
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        let mut state = self.state();
        state.counts.lists += 1;
        Ok(state.nodes.clone())
    }

    async fn replace_service(&self, service: &Service) -> Result<()> {
        let mut state = self.state();
        Self::begin_write(&mut state, |c| c.updates += 1)?;
        let key = key_of(service, None);
        if !state.services.contains_key(&key) {
            return Err(not_found(&service.name_any()));
        }
        state.services.insert(key, service.clone());
        Ok(())
    }

    async fn get_ingress(&self, namespace: &str, name: &str) -> Result<Option<Ingress>> {
        let mut state = self.state();
        state.counts.gets += 1;
        Ok(state
            .ingresses
            .get(&ServiceKey::new(namespace, name))
            .cloned())
    }

    async fn create_ingress(&self, namespace: &str, ingress: &Ingress) -> Result<()> {
        let mut state = self.state();
        Self::begin_write(&mut state, |c| c.creates += 1)?;
        let key = key_of(ingress, Some(namespace));
        if state.ingresses.contains_key(&key) {
            return Err(already_exists(&key.name));
        }
        let mut stored = ingress.clone();
        stored.metadata.namespace = Some(namespace.to_string());
        state.ingresses.insert(key, stored);
        Ok(())
    }

    async fn replace_ingress(&self, namespace: &str, ingress: &Ingress) -> Result<()> {
        let mut state = self.state();
        Self::begin_write(&mut state, |c| c.updates += 1)?;
        let key = key_of(ingress, Some(namespace));
        if !state.ingresses.contains_key(&key) {
            return Err(not_found(&key.name));
        }
        state.ingresses.insert(key, ingress.clone());
        Ok(())
    }

    async fn delete_ingress(&self, namespace: &str, name: &str) -> Result<bool> {
        let mut state = self.state();
        Self::begin_write(&mut state, |c| c.deletes += 1)?;
        Ok(state
            .ingresses
            .remove(&ServiceKey::new(namespace, name))
            .is_some())
    }

    async fn get_route(&self, namespace: &str, name: &str) -> Result<Option<Route>> {
        let mut state = self.state();
        state.counts.gets += 1;
        Ok(state.routes.get(&ServiceKey::new(namespace, name)).cloned())
    }

    async fn create_route(&self, namespace: &str, route: &Route) -> Result<()> {
        let mut state = self.state();
        Self::begin_write(&mut state, |c| c.creates += 1)?;
        let key = key_of(route, Some(namespace));
        if state.routes.contains_key(&key) {
            return Err(already_exists(&key.name));
        }
        let mut stored = route.clone();
        stored.metadata.namespace = Some(namespace.to_string());
        state.routes.insert(key, stored);
        Ok(())
    }

    async fn replace_route(&self, namespace: &str, route: &Route) -> Result<()> {
        let mut state = self.state();
        Self::begin_write(&mut state, |c| c.updates += 1)?;
        let key = key_of(route, Some(namespace));
        if !state.routes.contains_key(&key) {
            return Err(not_found(&key.name));
        }
        state.routes.insert(key, route.clone());
        Ok(())
    }

    async fn delete_route(&self, namespace: &str, name: &str) -> Result<bool> {
        let mut state = self.state();
        Self::begin_write(&mut state, |c| c.deletes += 1)?;
        Ok(state
            .routes
            .remove(&ServiceKey::new(namespace, name))
            .is_some())
    }
}
