//! Exposure backends
//!
//! Each backend owns one way of making a service reachable from outside the
//! cluster:
//! - **Ingress**: an Ingress rule named after the service
//! - **Route**: an OpenShift Route named after the service
//! - **NodePort**: converts the service to `NodePort` on a single-node cluster
//! - **LoadBalancer**: converts the service to `LoadBalancer`
//!
//! Backends only touch their own resource. Writing the URL back onto the
//! service is left to the [`AnnotationRecorder`](crate::annotations::AnnotationRecorder).

mod ingress;
mod load_balancer;
mod node_port;
mod route;

pub use ingress::IngressExposer;
pub use load_balancer::LoadBalancerExposer;
pub use node_port::NodePortExposer;
pub use route::RouteExposer;

use async_trait::async_trait;
use expose_core::{ExposeStrategy, exposure_requested};
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ExposeError, Result};

/// Kind of cluster the controller runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Kubernetes,
    OpenShift,
}

impl Platform {
    pub fn from_openshift(openshift: bool) -> Self {
        if openshift {
            Platform::OpenShift
        } else {
            Platform::Kubernetes
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Kubernetes => f.write_str("Kubernetes"),
            Platform::OpenShift => f.write_str("OpenShift"),
        }
    }
}

/// Result of ensuring a service is exposed
#[derive(Debug, Clone)]
pub enum Exposure {
    /// Nothing to do for this service
    Skipped(&'static str),

    /// The backend resource is in place
    Ready {
        /// The service, including any mutation the backend made to it
        service: Service,
        /// Externally reachable `host[:port]`, if already known
        host: Option<String>,
        /// The backend created or updated its resource this round
        changed: bool,
    },
}

/// Result of retracting a service's exposure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retraction {
    /// The backend resource was deleted
    Deleted,
    /// There was no backend resource
    Absent,
    /// The strategy owns no side resource; the service is left as is
    Kept,
}

/// Common interface of the four exposure strategies
#[async_trait]
pub trait ExposureBackend: Send + Sync {
    fn strategy(&self) -> ExposeStrategy;

    /// The only platform this backend can run on, if restricted
    fn required_platform(&self) -> Option<Platform> {
        None
    }

    /// Create or update the external-access resource for `service`
    async fn ensure(&self, service: &Service, domain: &str) -> Result<Exposure>;

    /// Remove the external-access resource for `namespace/name`
    async fn retract(&self, namespace: &str, name: &str) -> Result<Retraction>;
}

/// `<service>.<namespace>.<domain>`
pub fn hostname(name: &str, namespace: &str, domain: &str) -> String {
    format!("{name}.{namespace}.{domain}")
}

/// Labels placed on every resource the controller creates
pub(crate) fn provider_labels() -> BTreeMap<String, String> {
    BTreeMap::from([(
        expose_core::constants::PROVIDER_LABEL_KEY.to_string(),
        expose_core::constants::PROVIDER_LABEL_VALUE.to_string(),
    )])
}

/// `true` when `service` carries the exposure label; logs the skip otherwise
pub(crate) fn check_requested(service: &Service) -> bool {
    let requested = exposure_requested(service.metadata.labels.as_ref());
    if !requested {
        tracing::debug!(service = %service.name_any(), "Skipping service without expose label");
    }
    requested
}

pub(crate) fn service_namespace(service: &Service) -> Result<String> {
    service
        .namespace()
        .ok_or_else(|| ExposeError::IncompleteObject {
            kind: "Service".to_string(),
            field: "namespace".to_string(),
        })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostname() {
        assert_eq!(hostname("foo", "bar", "example.com"), "foo.bar.example.com");
    }

    #[test]
    fn test_platform_display() {
        assert_eq!(Platform::from_openshift(true).to_string(), "OpenShift");
        assert_eq!(Platform::from_openshift(false), Platform::Kubernetes);
    }
}
