//! CLI commands

pub mod check;
pub mod run;

use expose_kube::KubeCluster;

use crate::error::{CliError, Result};

/// Connection settings shared by every command
#[derive(Debug, Clone)]
pub struct ClusterOptions {
    pub namespace: Option<String>,
    pub config_name: String,
}

/// Connect with the inferred kube configuration
pub(crate) async fn connect() -> Result<KubeCluster> {
    KubeCluster::try_default().await.map_err(CliError::cluster)
}

/// The explicit namespace, else the client's default one
pub(crate) fn resolve_namespace(explicit: Option<&str>, cluster: &KubeCluster) -> String {
    match explicit {
        Some(namespace) if !namespace.is_empty() => namespace.to_string(),
        _ => cluster.kube_client().default_namespace().to_string(),
    }
}
