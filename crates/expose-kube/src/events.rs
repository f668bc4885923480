//! Service lifecycle events delivered to the reconciler

use expose_core::{CoreError, ServiceKey};
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;

/// One observed change to a service
#[derive(Debug, Clone)]
pub enum ServiceEvent {
    /// A service appeared, or is re-delivered by a resync
    Added(Service),
    /// A known service changed
    Updated { old: Service, new: Service },
    /// A service is gone
    Deleted(DeletedService),
}

/// Payload of a deletion
#[derive(Debug, Clone)]
pub enum DeletedService {
    /// The last known state of the service
    Live(Service),
    /// Only the `namespace/name` key is known (deleted while unobserved)
    Tombstone { key: String },
}

impl DeletedService {
    /// Identity of the deleted service
    pub fn key(&self) -> Result<ServiceKey, CoreError> {
        match self {
            DeletedService::Live(service) => match service.namespace() {
                Some(namespace) => Ok(ServiceKey::new(namespace, service.name_any())),
                None => Err(CoreError::MalformedKey {
                    key: service.name_any(),
                }),
            },
            DeletedService::Tombstone { key } => key.parse(),
        }
    }
}

/// Identity of a live service, if its metadata is complete
pub fn service_key(service: &Service) -> Option<ServiceKey> {
    let name = service.metadata.name.clone()?;
    let namespace = service.namespace()?;
    Some(ServiceKey::new(namespace, name))
}
