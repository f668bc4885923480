//! `ClusterApi` backed by the Kubernetes API server

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Node, Service};
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::{Client, Resource, ResourceExt};
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::ClusterApi;
use crate::error::{ExposeError, Result};
use crate::route::{ROUTE_API_GROUP, Route};

/// Cluster access through a `kube::Client`
///
/// API discovery is done once; the platform of a running cluster does not change.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
    openshift: Arc<OnceCell<bool>>,
}

impl KubeCluster {
    /// Connect using the inferred configuration (in-cluster or kubeconfig)
    pub async fn try_default() -> Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self::with_client(client))
    }

    /// Create with an existing client
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            openshift: Arc::new(OnceCell::new()),
        }
    }

    /// Get the underlying Kubernetes client
    pub fn kube_client(&self) -> &Client {
        &self.client
    }

    fn ingresses(&self, namespace: &str) -> Api<Ingress> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn routes(&self, namespace: &str) -> Api<Route> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Name of an object about to be written
fn object_name<K: Resource<DynamicType = ()>>(obj: &K) -> Result<String> {
    obj.meta()
        .name
        .clone()
        .ok_or_else(|| ExposeError::IncompleteObject {
            kind: K::kind(&()).to_string(),
            field: "name".to_string(),
        })
}

/// Delete, treating 404 as "nothing to delete"
async fn delete_named<K>(api: Api<K>, name: &str) -> Result<bool>
where
    K: Resource + Clone + serde::de::DeserializeOwned + std::fmt::Debug,
{
    match api.delete(name, &DeleteParams::default()).await {
        Ok(_) => Ok(true),
        Err(kube::Error::Api(resp)) if resp.code == 404 => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl ClusterApi for KubeCluster {
    async fn is_openshift(&self) -> Result<bool> {
        let openshift = self
            .openshift
            .get_or_try_init(|| async {
                let groups = self.client.list_api_groups().await?;
                let found = groups.groups.iter().any(|g| g.name == ROUTE_API_GROUP);
                tracing::debug!(openshift = found, "Discovered cluster platform");
                Ok::<_, ExposeError>(found)
            })
            .await?;
        Ok(*openshift)
    }

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        let api: Api<Node> = Api::all(self.client.clone());
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn replace_service(&self, service: &Service) -> Result<()> {
        let name = object_name(service)?;
        let namespace = service
            .namespace()
            .ok_or_else(|| ExposeError::IncompleteObject {
                kind: "Service".to_string(),
                field: "namespace".to_string(),
            })?;
        let api: Api<Service> = Api::namespaced(self.client.clone(), &namespace);
        api.replace(&name, &PostParams::default(), service).await?;
        Ok(())
    }

    async fn get_ingress(&self, namespace: &str, name: &str) -> Result<Option<Ingress>> {
        Ok(self.ingresses(namespace).get_opt(name).await?)
    }

    async fn create_ingress(&self, namespace: &str, ingress: &Ingress) -> Result<()> {
        self.ingresses(namespace)
            .create(&PostParams::default(), ingress)
            .await?;
        Ok(())
    }

    async fn replace_ingress(&self, namespace: &str, ingress: &Ingress) -> Result<()> {
        let name = object_name(ingress)?;
        self.ingresses(namespace)
            .replace(&name, &PostParams::default(), ingress)
            .await?;
        Ok(())
    }

    async fn delete_ingress(&self, namespace: &str, name: &str) -> Result<bool> {
        delete_named(self.ingresses(namespace), name).await
    }

    async fn get_route(&self, namespace: &str, name: &str) -> Result<Option<Route>> {
        Ok(self.routes(namespace).get_opt(name).await?)
    }

    async fn create_route(&self, namespace: &str, route: &Route) -> Result<()> {
        self.routes(namespace)
            .create(&PostParams::default(), route)
            .await?;
        Ok(())
    }

    async fn replace_route(&self, namespace: &str, route: &Route) -> Result<()> {
        let name = object_name(route)?;
        self.routes(namespace)
            .replace(&name, &PostParams::default(), route)
            .await?;
        Ok(())
    }

    async fn delete_route(&self, namespace: &str, name: &str) -> Result<bool> {
        delete_named(self.routes(namespace), name).await
    }
}
