//! OpenShift Route exposure

use async_trait::async_trait;
use expose_core::ExposeStrategy;
use expose_core::constants::KUBERNETES_SERVICE;
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use std::sync::Arc;

use super::{
    Exposure, ExposureBackend, Platform, Retraction, check_requested, hostname, provider_labels,
    service_namespace,
};
use crate::cluster::ClusterApi;
use crate::error::Result;
use crate::route::{Route, RouteSpec, RouteTargetReference};

/// Exposes services through OpenShift Routes
#[derive(Clone)]
pub struct RouteExposer {
    cluster: Arc<dyn ClusterApi>,
}

impl RouteExposer {
    pub fn new(cluster: Arc<dyn ClusterApi>) -> Self {
        Self { cluster }
    }
}

/// Build the Route for a service
pub fn build_route(name: &str, namespace: &str, host: &str) -> Route {
    let mut route = Route::new(
        name,
        RouteSpec {
            host: Some(host.to_string()),
            to: RouteTargetReference::service(name),
            ..Default::default()
        },
    );
    route.metadata.namespace = Some(namespace.to_string());
    route.metadata.labels = Some(provider_labels());
    route
}

#[async_trait]
impl ExposureBackend for RouteExposer {
    fn strategy(&self) -> ExposeStrategy {
        ExposeStrategy::Route
    }

    fn required_platform(&self) -> Option<Platform> {
        Some(Platform::OpenShift)
    }

    async fn ensure(&self, service: &Service, domain: &str) -> Result<Exposure> {
        if !check_requested(service) {
            return Ok(Exposure::Skipped("missing expose label"));
        }

        let name = service.name_any();
        if name == KUBERNETES_SERVICE {
            return Ok(Exposure::Skipped("the kubernetes service is never routed"));
        }

        let namespace = service_namespace(service)?;
        let host = hostname(&name, &namespace, domain);

        let changed = match self.cluster.get_route(&namespace, &name).await? {
            None => {
                let route = build_route(&name, &namespace, &host);
                self.cluster.create_route(&namespace, &route).await?;
                tracing::info!(
                    service = %name,
                    namespace = %namespace,
                    host = %host,
                    "Exposed service using openshift route"
                );
                true
            }
            Some(mut route) if route.spec.host.as_deref() != Some(host.as_str()) => {
                // Only the host changes; unmanaged spec fields ride along
                route.spec.host = Some(host.clone());
                self.cluster.replace_route(&namespace, &route).await?;
                tracing::info!(
                    route = %name,
                    namespace = %namespace,
                    host = %host,
                    "Updated route hostname"
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
        if self.cluster.get_route(namespace, name).await?.is_none() {
            return Ok(Retraction::Absent);
        }

        if self.cluster.delete_route(namespace, name).await? {
            tracing::info!(route = %name, namespace = %namespace, "Deleted openshift route");
            Ok(Retraction::Deleted)
        } else {
            Ok(Retraction::Absent)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::test_support::{exposed_service, unlabeled_service};
    use crate::cluster::MockCluster;

    fn setup() -> (Arc<MockCluster>, RouteExposer) {
        let cluster = Arc::new(MockCluster::new().with_openshift(true));
        let exposer = RouteExposer::new(cluster.clone());
        (cluster, exposer)
    }

    #[tokio::test]
    async fn test_creates_route() {
        let (cluster, exposer) = setup();

        let exposure = exposer.ensure(&exposed_service(), "example.com").await.unwrap();
        match exposure {
            Exposure::Ready { host, changed, .. } => {
                assert!(changed);
                assert_eq!(host.as_deref(), Some("foo.bar.example.com"));
            }
            other => panic!("expected Ready, got {other:?}"),
        }

        let route = cluster.route("bar", "foo").unwrap();
        assert_eq!(route.spec.host.as_deref(), Some("foo.bar.example.com"));
        assert_eq!(route.spec.to.kind, "Service");
        assert_eq!(route.spec.to.name, "foo");
        assert_eq!(route.labels().get("provider").map(String::as_str), Some("fabric8"));
    }

    #[tokio::test]
    async fn test_route_unchanged_is_not_rewritten() {
        let (cluster, exposer) = setup();
        exposer.ensure(&exposed_service(), "example.com").await.unwrap();
        cluster.reset_counts();

        let exposure = exposer.ensure(&exposed_service(), "example.com").await.unwrap();
        assert!(matches!(exposure, Exposure::Ready { changed: false, .. }));
        assert_eq!(cluster.operation_counts().writes(), 0);
    }

    #[tokio::test]
    async fn test_route_host_drift_is_patched() {
        let cluster = Arc::new(
            MockCluster::new()
                .with_openshift(true)
                .with_route(build_route("foo", "bar", "foo.bar.old.io")),
        );
        let exposer = RouteExposer::new(cluster.clone());

        exposer.ensure(&exposed_service(), "new.io").await.unwrap();

        assert_eq!(cluster.operation_counts().updates, 1);
        assert_eq!(
            cluster.route("bar", "foo").unwrap().spec.host.as_deref(),
            Some("foo.bar.new.io")
        );
    }

    #[tokio::test]
    async fn test_host_fix_keeps_tls_and_port() {
        let mut existing = build_route("foo", "bar", "foo.bar.old.io");
        existing.spec = serde_json::from_value(serde_json::json!({
            "host": "foo.bar.old.io",
            "to": {"kind": "Service", "name": "foo", "weight": 100},
            "port": {"targetPort": "https"},
            "tls": {"termination": "passthrough"},
            "wildcardPolicy": "None"
        }))
        .unwrap();
        let cluster = Arc::new(MockCluster::new().with_openshift(true).with_route(existing));
        let exposer = RouteExposer::new(cluster.clone());

        exposer.ensure(&exposed_service(), "example.com").await.unwrap();

        let stored = serde_json::to_value(cluster.route("bar", "foo").unwrap().spec).unwrap();
        assert_eq!(stored["host"], "foo.bar.example.com");
        assert_eq!(stored["tls"]["termination"], "passthrough");
        assert_eq!(stored["port"]["targetPort"], "https");
        assert_eq!(stored["to"]["weight"], 100);
        assert_eq!(stored["wildcardPolicy"], "None");
    }

    #[tokio::test]
    async fn test_kubernetes_service_is_never_routed() {
        let (cluster, exposer) = setup();
        let mut service = exposed_service();
        service.metadata.name = Some("kubernetes".to_string());

        let exposure = exposer.ensure(&service, "example.com").await.unwrap();
        assert!(matches!(exposure, Exposure::Skipped(_)));
        assert!(cluster.route("bar", "kubernetes").is_none());
    }

    #[tokio::test]
    async fn test_unlabeled_service_is_skipped() {
        let (cluster, exposer) = setup();
        let exposure = exposer.ensure(&unlabeled_service(), "example.com").await.unwrap();
        assert!(matches!(exposure, Exposure::Skipped(_)));
        assert_eq!(cluster.operation_counts().writes(), 0);
    }

    #[tokio::test]
    async fn test_retract() {
        let (cluster, exposer) = setup();
        assert_eq!(exposer.retract("bar", "foo").await.unwrap(), Retraction::Absent);

        exposer.ensure(&exposed_service(), "example.com").await.unwrap();
        assert_eq!(exposer.retract("bar", "foo").await.unwrap(), Retraction::Deleted);
        assert_eq!(cluster.operation_counts().deletes, 1);
    }
}
