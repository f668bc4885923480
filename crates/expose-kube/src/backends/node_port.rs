//! NodePort exposure
//!
//! Only single-node clusters are supported: the node's
//! `kubernetes.io/externalIP` annotation plus the assigned node port is the
//! external address. With more than one node there is no sound way to pick
//! one, so the service is left untouched.

use async_trait::async_trait;
use expose_core::ExposeStrategy;
use expose_core::constants::EXTERNAL_IP_ANNOTATION;
use k8s_openapi::api::core::v1::{Node, Service};
use kube::ResourceExt;
use std::sync::Arc;

use super::{Exposure, ExposureBackend, Retraction, check_requested};
use crate::cluster::ClusterApi;
use crate::error::{ExposeError, Result};

pub(crate) const NODE_PORT_TYPE: &str = "NodePort";

/// Exposes services by converting them to `NodePort`
#[derive(Clone)]
pub struct NodePortExposer {
    cluster: Arc<dyn ClusterApi>,
}

impl NodePortExposer {
    pub fn new(cluster: Arc<dyn ClusterApi>) -> Self {
        Self { cluster }
    }

    /// External IP of the single cluster node
    async fn external_ip(&self, service: &str) -> Result<String> {
        let nodes = self.cluster.list_nodes().await?;
        if nodes.len() > 1 {
            return Err(ExposeError::MultiNodeCluster {
                service: service.to_string(),
                count: nodes.len(),
            });
        }

        nodes
            .first()
            .and_then(node_external_ip)
            .ok_or_else(|| ExposeError::MissingExternalIp {
                service: service.to_string(),
                annotation: EXTERNAL_IP_ANNOTATION.to_string(),
            })
    }
}

fn node_external_ip(node: &Node) -> Option<String> {
    node.annotations()
        .get(EXTERNAL_IP_ANNOTATION)
        .filter(|ip| !ip.is_empty())
        .cloned()
}

#[async_trait]
impl ExposureBackend for NodePortExposer {
    fn strategy(&self) -> ExposeStrategy {
        ExposeStrategy::NodePort
    }

    /// Convert the service to `NodePort` and report `<node ip>:<node port>`
    ///
    /// A service has a single URL annotation, so only the first declared
    /// port is exposed; further ports are reported with a warning instead of
    /// each overwriting the annotation in turn.
    async fn ensure(&self, service: &Service, _domain: &str) -> Result<Exposure> {
        if !check_requested(service) {
            return Ok(Exposure::Skipped("missing expose label"));
        }

        let name = service.name_any();
        let ip = self.external_ip(&name).await?;

        let mut service = service.clone();
        let spec = service.spec.get_or_insert_with(Default::default);
        let changed = spec.type_.as_deref() != Some(NODE_PORT_TYPE);
        if changed {
            spec.type_ = Some(NODE_PORT_TYPE.to_string());
            tracing::info!(service = %name, "Updating service using NodePort");
        }

        let ports = spec.ports.as_deref().unwrap_or_default();
        if ports.len() > 1 {
            tracing::warn!(
                service = %name,
                ports = ports.len(),
                "Found several ports, exposing the first one"
            );
        }
        // Node ports are assigned by the API server after the type change
        let host = ports
            .first()
            .and_then(|port| port.node_port)
            .filter(|port| *port > 0)
            .map(|port| format!("{ip}:{port}"));

        Ok(Exposure::Ready {
            service,
            host,
            changed,
        })
    }

    async fn retract(&self, _namespace: &str, _name: &str) -> Result<Retraction> {
        Ok(Retraction::Kept)
    }
}
