//! Annotation recorder
//!
//! Writes the computed external URL onto the service under
//! [`EXPOSE_URL_ANNOTATION`]. The service is only written when the URL
//! differs from the stored one or when the backend reports that the
//! service itself changed, so steady-state reconciliation is a no-op.

use expose_core::constants::EXPOSE_URL_ANNOTATION;
use expose_core::expose_url;
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use std::sync::Arc;

use crate::cluster::ClusterApi;

/// Current value of the URL annotation
pub fn stored_url(service: &Service) -> Option<&str> {
    service
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(EXPOSE_URL_ANNOTATION))
        .map(String::as_str)
}

/// External URL for `host`, with the scheme inferred from the service ports
pub fn service_url(service: &Service, host: &str) -> String {
    let port_names = service
        .spec
        .as_ref()
        .and_then(|spec| spec.ports.as_ref())
        .into_iter()
        .flatten()
        .filter_map(|port| port.name.as_deref());
    expose_url(host, port_names)
}

/// Records exposure results back onto services
#[derive(Clone)]
pub struct AnnotationRecorder {
    cluster: Arc<dyn ClusterApi>,
}

impl AnnotationRecorder {
    pub fn new(cluster: Arc<dyn ClusterApi>) -> Self {
        Self { cluster }
    }

    /// Record the exposure of `service` at `host`
    ///
    /// `service_changed` forces a write even if the URL is unchanged; it is
    /// set when the backend mutated the service (e.g. its type). With no
    /// host yet, only such a mutation is written.
    ///
    /// Returns `true` if the service was written. Failures are logged.
    pub async fn record(
        &self,
        mut service: Service,
        host: Option<&str>,
        service_changed: bool,
    ) -> bool {
        let name = service.name_any();

        match host {
            Some(host) => {
                let new_url = service_url(&service, host);
                let existing_url = stored_url(&service);
                if existing_url == Some(new_url.as_str()) && !service_changed {
                    tracing::debug!(service = %name, url = %new_url, "Expose URL unchanged");
                    return false;
                }

                tracing::info!(
                    service = %name,
                    existing_url = existing_url.unwrap_or_default(),
                    new_url = %new_url,
                    service_changed,
                    "Updating expose URL"
                );
                service
                    .annotations_mut()
                    .insert(EXPOSE_URL_ANNOTATION.to_string(), new_url.clone());
                match self.cluster.replace_service(&service).await {
                    Ok(()) => {
                        tracing::info!(
                            service = %name,
                            url = %new_url,
                            "Added {} annotation",
                            EXPOSE_URL_ANNOTATION
                        );
                        true
                    }
                    Err(e) => {
                        tracing::warn!(
                            service = %name,
                            error = %e,
                            "Failed to add the {} annotation",
                            EXPOSE_URL_ANNOTATION
                        );
                        false
                    }
                }
            }
            None if service_changed => match self.cluster.replace_service(&service).await {
                Ok(()) => {
                    tracing::info!(service = %name, "Updated service, external address pending");
                    true
                }
                Err(e) => {
                    tracing::warn!(service = %name, error = %e, "Failed to update service");
                    false
                }
            },
            None => false,
        }
    }
}
