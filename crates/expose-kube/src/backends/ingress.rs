//! Ingress exposure
//!
//! One Ingress per service, named after it, with one rule per declared port.
//! An existing Ingress is only rewritten when its host drifted.

use async_trait::async_trait;
use expose_core::ExposeStrategy;
use k8s_openapi::api::core::v1::{Service, ServicePort};
use k8s_openapi::api::networking::v1 as networking;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::ResourceExt;
use std::sync::Arc;

use super::{
    Exposure, ExposureBackend, Platform, Retraction, check_requested, hostname, provider_labels,
    service_namespace,
};
use crate::cluster::ClusterApi;
use crate::error::Result;

const PATH_TYPE: &str = "ImplementationSpecific";

/// Exposes services through `networking.k8s.io/v1` Ingress rules
#[derive(Clone)]
pub struct IngressExposer {
    cluster: Arc<dyn ClusterApi>,
}

impl IngressExposer {
    pub fn new(cluster: Arc<dyn ClusterApi>) -> Self {
        Self { cluster }
    }
}

/// Backend port for a service port: its target port, else the port itself
fn backend_port(port: &ServicePort) -> networking::ServiceBackendPort {
    match &port.target_port {
        Some(IntOrString::Int(number)) => networking::ServiceBackendPort {
            number: Some(*number),
            name: None,
        },
        Some(IntOrString::String(name)) => networking::ServiceBackendPort {
            number: None,
            name: Some(name.clone()),
        },
        None => networking::ServiceBackendPort {
            number: Some(port.port),
            name: None,
        },
    }
}

/// Build the Ingress for a service
pub fn build_ingress(
    name: &str,
    namespace: &str,
    host: &str,
    ports: &[ServicePort],
) -> networking::Ingress {
    let rules = ports
        .iter()
        .map(|port| networking::IngressRule {
            host: Some(host.to_string()),
            http: Some(networking::HTTPIngressRuleValue {
                paths: vec![networking::HTTPIngressPath {
                    path: Some("/".to_string()),
                    path_type: PATH_TYPE.to_string(),
                    backend: networking::IngressBackend {
                        service: Some(networking::IngressServiceBackend {
                            name: name.to_string(),
                            port: Some(backend_port(port)),
                        }),
                        resource: None,
                    },
                }],
            }),
        })
        .collect();

    networking::Ingress {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(provider_labels()),
            ..Default::default()
        },
        spec: Some(networking::IngressSpec {
            rules: Some(rules),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn has_rules(ingress: &networking::Ingress) -> bool {
    ingress
        .spec
        .as_ref()
        .and_then(|spec| spec.rules.as_ref())
        .is_some_and(|rules| !rules.is_empty())
}

/// Host of the first rule, which all rules share
fn current_host(ingress: &networking::Ingress) -> Option<&str> {
    ingress
        .spec
        .as_ref()?
        .rules
        .as_ref()?
        .first()?
        .host
        .as_deref()
}

/// Point every rule at `host`
fn set_host(ingress: &mut networking::Ingress, host: &str) {
    let rules = ingress
        .spec
        .iter_mut()
        .filter_map(|spec| spec.rules.as_mut())
        .flatten();
    for rule in rules {
        rule.host = Some(host.to_string());
    }
}

#[async_trait]
impl ExposureBackend for IngressExposer {
    fn strategy(&self) -> ExposeStrategy {
        ExposeStrategy::Ingress
    }

    fn required_platform(&self) -> Option<Platform> {
        Some(Platform::Kubernetes)
    }

    async fn ensure(&self, service: &Service, domain: &str) -> Result<Exposure> {
        if !check_requested(service) {
            return Ok(Exposure::Skipped("missing expose label"));
        }

        let name = service.name_any();
        let namespace = service_namespace(service)?;
        let host = hostname(&name, &namespace, domain);

        let changed = match self.cluster.get_ingress(&namespace, &name).await? {
            None => {
                let ports = service
                    .spec
                    .as_ref()
                    .and_then(|spec| spec.ports.as_deref())
                    .unwrap_or_default();
                if ports.is_empty() {
                    tracing::debug!(
                        service = %name,
                        "Service declares no ports, no ingress created"
                    );
                    return Ok(Exposure::Skipped("no ports declared"));
                }

                let ingress = build_ingress(&name, &namespace, &host, ports);
                self.cluster.create_ingress(&namespace, &ingress).await?;
                tracing::info!(
                    service = %name,
                    namespace = %namespace,
                    host = %host,
                    "Exposed service using ingress rule"
                );
                true
            }
            Some(mut ingress)
                if has_rules(&ingress) && current_host(&ingress) != Some(host.as_str()) =>
            {
                set_host(&mut ingress, &host);
                self.cluster.replace_ingress(&namespace, &ingress).await?;
                tracing::info!(
                    ingress = %name,
                    namespace = %namespace,
                    host = %host,
                    "Updated ingress hostname"
                );
                true
            }
            Some(_) => false,
        };

        Ok(Exposure::Ready {
            service: service.clone(),
            host: Some(host),
            changed,
        })
    }

    async fn retract(&self, namespace: &str, name: &str) -> Result<Retraction> {
        if self.cluster.get_ingress(namespace, name).await?.is_none() {
            return Ok(Retraction::Absent);
        }

        if self.cluster.delete_ingress(namespace, name).await? {
            tracing::info!(ingress = %name, namespace = %namespace, "Deleted ingress rule");
            Ok(Retraction::Deleted)
        } else {
            Ok(Retraction::Absent)
        }
    }
}
