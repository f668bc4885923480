//! Error types for expose-kube

use expose_core::CoreError;
use thiserror::Error;

/// Result type for expose-kube operations
pub type Result<T> = std::result::Result<T, ExposeError>;

/// Errors that can occur while reconciling services
///
/// Fatal variants mean the controller is not deployed correctly and cannot
/// make progress; everything else is logged and retried on the next resync.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExposeError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// The configuration ConfigMap could not be read
    #[error("no ConfigMap with name '{name}' found in namespace '{namespace}'\nHint: create it with the 'domain' and 'expose-rule' keys")]
    MissingConfig {
        name: String,
        namespace: String,
        #[source]
        source: Option<kube::Error>,
    },

    /// The ConfigMap exists but its content is unusable
    #[error("invalid configuration in namespace '{namespace}': {source}")]
    InvalidConfig {
        namespace: String,
        #[source]
        source: CoreError,
    },

    /// A delete notification did not resolve to a service identity
    #[error("error getting details of deleted service: {0}")]
    MalformedDelete(#[source] CoreError),

    /// The configured strategy cannot run on this platform
    #[error("{strategy} is not supported on {platform}: {hint}")]
    PlatformMismatch {
        strategy: String,
        platform: String,
        hint: String,
    },

    /// Node-port exposure on a cluster with more than one node
    #[error("using NodePorts on clusters of more than one node is not supported ({count} nodes); unable to expose service '{service}'")]
    MultiNodeCluster { service: String, count: usize },

    /// An object is missing metadata the controller relies on
    #[error("{kind} is missing metadata.{field}")]
    IncompleteObject { kind: String, field: String },

    /// No node advertises its external IP
    #[error("unable to find the '{annotation}' annotation on any node; unable to expose service '{service}'")]
    MissingExternalIp { service: String, annotation: String },
}

impl ExposeError {
    /// Check if this is a Kubernetes 404 Not Found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, ExposeError::Api(kube::Error::Api(resp)) if resp.code == 404)
    }

    /// Check if this is a conflict error (409)
    pub fn is_conflict(&self) -> bool {
        matches!(self, ExposeError::Api(kube::Error::Api(resp)) if resp.code == 409)
    }

    /// Check if this error must stop the controller
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExposeError::MissingConfig { .. }
                | ExposeError::InvalidConfig { .. }
                | ExposeError::MalformedDelete(_)
        )
    }
}
