//! Strategy dispatcher
//!
//! Maps an [`ExposeStrategy`] to its backend and runs it. Backend failures
//! are logged and reported as an outcome; they never stop the watch loop.

use expose_core::{ExposeStrategy, ServiceKey};
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use std::sync::Arc;

use crate::annotations::AnnotationRecorder;
use crate::backends::{
    Exposure, ExposureBackend, IngressExposer, LoadBalancerExposer, NodePortExposer, Retraction,
    RouteExposer,
};
use crate::cluster::ClusterApi;

/// Outcome of exposing one service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The service is not eligible (label, platform or name)
    Skipped,
    /// The backend resource is in place
    Exposed {
        host: Option<String>,
        service_written: bool,
    },
    /// The backend failed; the next resync retries
    Failed,
}

/// Outcome of retracting one service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetractOutcome {
    Done(Retraction),
    Failed,
}

/// Owns one backend per strategy and the annotation recorder
pub struct StrategyDispatcher {
    ingress: IngressExposer,
    route: RouteExposer,
    node_port: NodePortExposer,
    load_balancer: LoadBalancerExposer,
    recorder: AnnotationRecorder,
}

impl StrategyDispatcher {
    pub fn new(cluster: Arc<dyn ClusterApi>) -> Self {
        Self {
            ingress: IngressExposer::new(cluster.clone()),
            route: RouteExposer::new(cluster.clone()),
            node_port: NodePortExposer::new(cluster.clone()),
            load_balancer: LoadBalancerExposer,
            recorder: AnnotationRecorder::new(cluster),
        }
    }

    /// Backend implementing `strategy`
    pub fn backend(&self, strategy: ExposeStrategy) -> &dyn ExposureBackend {
        match strategy {
            ExposeStrategy::Ingress => &self.ingress,
            ExposeStrategy::Route => &self.route,
            ExposeStrategy::NodePort => &self.node_port,
            ExposeStrategy::LoadBalancer => &self.load_balancer,
        }
    }

    /// Ensure `service` is exposed and record its URL
    pub async fn apply(
        &self,
        strategy: ExposeStrategy,
        service: &Service,
        domain: &str,
    ) -> ApplyOutcome {
        match self.backend(strategy).ensure(service, domain).await {
            Ok(Exposure::Skipped(reason)) => {
                tracing::debug!(
                    service = %service.name_any(),
                    %strategy,
                    reason,
                    "Skipping service"
                );
                ApplyOutcome::Skipped
            }
            Ok(Exposure::Ready {
                service,
                host,
                changed,
            }) => {
                let service_written = self.recorder.record(service, host.as_deref(), changed).await;
                ApplyOutcome::Exposed {
                    host,
                    service_written,
                }
            }
            Err(e) => {
                tracing::error!(
                    service = %service.name_any(),
                    namespace = %service.namespace().unwrap_or_default(),
                    %strategy,
                    error = %e,
                    "Unable to expose service"
                );
                ApplyOutcome::Failed
            }
        }
    }

    /// Remove whatever `strategy` created for `key`
    pub async fn retract(&self, strategy: ExposeStrategy, key: &ServiceKey) -> RetractOutcome {
        match self.backend(strategy).retract(&key.namespace, &key.name).await {
            Ok(retraction) => {
                tracing::debug!(service = %key, %strategy, ?retraction, "Retracted exposure");
                RetractOutcome::Done(retraction)
            }
            Err(e) => {
                tracing::error!(
                    service = %key,
                    %strategy,
                    error = %e,
                    "Failed to retract exposure"
                );
                RetractOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::test_support::exposed_service;
    use crate::cluster::MockCluster;

    #[test]
    fn test_backend_lookup_matches_strategy() {
        let dispatcher = StrategyDispatcher::new(Arc::new(MockCluster::new()));
        for strategy in ExposeStrategy::ALL {
            assert_eq!(dispatcher.backend(strategy).strategy(), strategy);
        }
    }

    #[tokio::test]
    async fn test_apply_records_url() {
        let cluster = Arc::new(MockCluster::new().with_service(exposed_service()));
        let dispatcher = StrategyDispatcher::new(cluster.clone());

        let outcome = dispatcher
            .apply(ExposeStrategy::Ingress, &exposed_service(), "example.com")
            .await;

        assert_eq!(
            outcome,
            ApplyOutcome::Exposed {
                host: Some("foo.bar.example.com".to_string()),
                service_written: true,
            }
        );
        let stored = cluster.service("bar", "foo").unwrap();
        assert_eq!(
            crate::annotations::stored_url(&stored),
            Some("http://foo.bar.example.com")
        );
    }

    #[tokio::test]
    async fn test_apply_failure_is_contained() {
        let cluster = Arc::new(MockCluster::new().with_service(exposed_service()));
        cluster.fail_writes(true);
        let dispatcher = StrategyDispatcher::new(cluster);

        let outcome = dispatcher
            .apply(ExposeStrategy::Route, &exposed_service(), "example.com")
            .await;
        assert_eq!(outcome, ApplyOutcome::Failed);
    }

    #[tokio::test]
    async fn test_retract_failure_is_contained() {
        let cluster = Arc::new(MockCluster::new());
        let dispatcher = StrategyDispatcher::new(cluster.clone());
        dispatcher
            .apply(ExposeStrategy::Ingress, &exposed_service(), "example.com")
            .await;
        cluster.fail_writes(true);

        let outcome = dispatcher
            .retract(ExposeStrategy::Ingress, &ServiceKey::new("bar", "foo"))
            .await;
        assert_eq!(outcome, RetractOutcome::Failed);
    }
}
