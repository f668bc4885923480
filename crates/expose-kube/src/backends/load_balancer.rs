//! LoadBalancer exposure

use async_trait::async_trait;
use expose_core::ExposeStrategy;
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;

use super::{Exposure, ExposureBackend, Retraction, check_requested};
use crate::error::Result;

pub(crate) const LOAD_BALANCER_TYPE: &str = "LoadBalancer";

/// Exposes services by converting them to `LoadBalancer`
///
/// No cluster access is needed: the service object carries the assigned
/// address once the cloud provider has provisioned it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadBalancerExposer;

/// Address assigned to a load-balanced service, if any yet
pub fn load_balancer_host(service: &Service) -> Option<String> {
    let from_status = service
        .status
        .as_ref()
        .and_then(|status| status.load_balancer.as_ref())
        .and_then(|lb| lb.ingress.as_ref())
        .and_then(|ingress| ingress.first())
        .and_then(|ingress| ingress.ip.clone().or_else(|| ingress.hostname.clone()));

    from_status
        .or_else(|| service.spec.as_ref().and_then(|spec| spec.load_balancer_ip.clone()))
        .filter(|host| !host.is_empty())
}

#[async_trait]
impl ExposureBackend for LoadBalancerExposer {
    fn strategy(&self) -> ExposeStrategy {
        ExposeStrategy::LoadBalancer
    }

    async fn ensure(&self, service: &Service, _domain: &str) -> Result<Exposure> {
        if !check_requested(service) {
            return Ok(Exposure::Skipped("missing expose label"));
        }

        let name = service.name_any();
        let mut service = service.clone();
        let spec = service.spec.get_or_insert_with(Default::default);
        let changed = spec.type_.as_deref() != Some(LOAD_BALANCER_TYPE);
        if changed {
            spec.type_ = Some(LOAD_BALANCER_TYPE.to_string());
            tracing::info!(
                service = %name,
                "Updating service using LoadBalancer, the cloud provider may take a few minutes"
            );
        }

        let host = load_balancer_host(&service);
        if host.is_none() {
            tracing::debug!(service = %name, "Load balancer address not assigned yet");
        }

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
