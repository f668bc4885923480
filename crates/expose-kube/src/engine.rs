//! Reconciliation engine
//!
//! Turns service lifecycle events into exposure intent:
//! - `Added` always attempts exposure
//! - `Updated` retracts when the expose label was present and is now gone
//!   or `false`, exposes when it is `true`, and ignores anything else
//! - `Deleted` retracts, whether the payload is the live object or a tombstone
//!
//! The engine keeps no state between events. Configuration and cluster
//! state are read fresh on every call. Only fatal errors are returned.

use expose_core::{
    ExposureConfig, ServiceKey, exposure_requested, exposure_withdrawn, has_exposure_label,
};
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use std::sync::Arc;

use crate::backends::Platform;
use crate::cluster::ClusterApi;
use crate::config::ConfigResolver;
use crate::dispatcher::{ApplyOutcome, RetractOutcome, StrategyDispatcher};
use crate::error::{ExposeError, Result};
use crate::events::{DeletedService, ServiceEvent};

/// Event handlers of the controller
pub struct Reconciler {
    cluster: Arc<dyn ClusterApi>,
    config: ConfigResolver,
    dispatcher: StrategyDispatcher,
}

impl Reconciler {
    pub fn new(cluster: Arc<dyn ClusterApi>, config: ConfigResolver) -> Self {
        let dispatcher = StrategyDispatcher::new(cluster.clone());
        Self {
            cluster,
            config,
            dispatcher,
        }
    }

    pub fn config_resolver(&self) -> &ConfigResolver {
        &self.config
    }

    /// Handle one event
    ///
    /// Returns `Err` only for fatal errors; the caller is expected to stop.
    pub async fn handle(&self, event: ServiceEvent) -> Result<()> {
        match event {
            ServiceEvent::Added(service) => {
                self.apply_exposure(&service).await?;
            }
            ServiceEvent::Updated { old, new } => self.on_updated(&old, &new).await?,
            ServiceEvent::Deleted(deleted) => self.on_deleted(&deleted).await?,
        }
        Ok(())
    }

    async fn on_updated(&self, old: &Service, new: &Service) -> Result<()> {
        let old_labels = old.metadata.labels.as_ref();
        let new_labels = new.metadata.labels.as_ref();

        if has_exposure_label(old_labels) && exposure_withdrawn(new_labels) {
            let key = ServiceKey::new(new.namespace().unwrap_or_default(), new.name_any());
            tracing::info!(service = %key, "Expose label removed, retracting exposure");
            self.retract_exposure(&key).await?;
            return Ok(());
        }

        if exposure_requested(new_labels) {
            self.apply_exposure(new).await?;
        }
        Ok(())
    }

    async fn on_deleted(&self, deleted: &DeletedService) -> Result<()> {
        let key = deleted.key().map_err(ExposeError::MalformedDelete)?;
        tracing::debug!(service = %key, "Service deleted");
        self.retract_exposure(&key).await?;
        Ok(())
    }

    /// Expose `service` with the configured strategy
    pub async fn apply_exposure(&self, service: &Service) -> Result<ApplyOutcome> {
        let config = self.config.resolve(self.cluster.as_ref()).await?;

        if let Err(e) = self.check_platform(&config).await {
            tracing::warn!(service = %service.name_any(), error = %e, "Skipping exposure");
            return Ok(match e {
                ExposeError::PlatformMismatch { .. } => ApplyOutcome::Skipped,
                _ => ApplyOutcome::Failed,
            });
        }

        Ok(self
            .dispatcher
            .apply(config.strategy, service, &config.domain)
            .await)
    }

    /// Retract whatever the configured strategy created for `key`
    pub async fn retract_exposure(&self, key: &ServiceKey) -> Result<RetractOutcome> {
        let config = self.config.resolve(self.cluster.as_ref()).await?;
        Ok(self.dispatcher.retract(config.strategy, key).await)
    }

    /// Reject strategies the cluster cannot serve
    ///
    /// Fails with [`ExposeError::PlatformMismatch`] when the strategy needs
    /// the other platform.
    pub async fn check_platform(&self, config: &ExposureConfig) -> Result<()> {
        let backend = self.dispatcher.backend(config.strategy);
        let Some(required) = backend.required_platform() else {
            return Ok(());
        };

        let platform = Platform::from_openshift(self.cluster.is_openshift().await?);
        if platform == required {
            return Ok(());
        }

        let hint = match required {
            Platform::OpenShift => "routes are only available on OpenShift, please use ingress",
            Platform::Kubernetes => {
                "ingress is not currently supported on OpenShift, please use routes"
            }
        };
        Err(ExposeError::PlatformMismatch {
            strategy: config.strategy.to_string(),
            platform: platform.to_string(),
            hint: hint.to_string(),
        })
    }
}
