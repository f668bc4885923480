//! Kubernetes integration for exposecontroller
//!
//! This crate watches services and keeps an external access path in place
//! for every service labelled `expose=true`:
//! - **Ingress**: one networking/v1 Ingress per service
//! - **Route**: one OpenShift Route per service
//! - **NodePort** / **LoadBalancer**: the service type itself is changed
//!
//! The resulting URL is written back to the service as the
//! `fabric8.io/exposeUrl` annotation.
//!
//! ## Example
//!
//! ```rust,ignore
//! use expose_kube::{ConfigResolver, EventSource, KubeCluster, Reconciler};
//! use std::sync::Arc;
//!
//! let cluster = KubeCluster::try_default().await?;
//! let client = cluster.kube_client().clone();
//! let config = ConfigResolver::new("fabric8");
//! let interval = config.resync_interval(&cluster).await?;
//!
//! let reconciler = Reconciler::new(Arc::new(cluster), config);
//! EventSource::new(client, interval)
//!     .run(&reconciler, tokio::signal::ctrl_c().map(|_| ()))
//!     .await?;
//! ```

pub mod annotations;
pub mod backends;
pub mod cluster;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod events;
pub mod route;
pub mod source;

pub use annotations::{AnnotationRecorder, service_url, stored_url};
pub use backends::{
    Exposure, ExposureBackend, IngressExposer, LoadBalancerExposer, NodePortExposer, Platform,
    Retraction, RouteExposer, hostname,
};
pub use cluster::{ClusterApi, KubeCluster, MockCluster, OperationCounts};
pub use config::ConfigResolver;
pub use dispatcher::{ApplyOutcome, RetractOutcome, StrategyDispatcher};
pub use engine::Reconciler;
pub use error::{ExposeError, Result};
pub use events::{DeletedService, ServiceEvent};
pub use route::{ROUTE_API_GROUP, Route, RouteSpec, RouteTargetReference};
pub use source::{EventSource, ServiceCache, run_stream};
