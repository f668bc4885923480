//! Run command - watch services and keep them exposed

use expose_kube::{ConfigResolver, EventSource, Reconciler};
use std::net::SocketAddr;
use std::sync::Arc;

use super::{ClusterOptions, connect, resolve_namespace};
use crate::error::{CliError, Result};
use crate::liveness;

/// Run the controller until a stop signal or a fatal error
pub async fn run(options: &ClusterOptions, liveness_addr: SocketAddr) -> Result<()> {
    let cluster = connect().await?;
    let client = cluster.kube_client().clone();
    let namespace = resolve_namespace(options.namespace.as_deref(), &cluster);

    let config = ConfigResolver::with_name(&namespace, &options.config_name);
    let resync_interval = config.resync_interval(&cluster).await?;
    tracing::info!(
        namespace = %namespace,
        config = %config.name(),
        resync_ms = resync_interval.as_millis() as u64,
        "Starting exposecontroller"
    );

    let reconciler = Reconciler::new(Arc::new(cluster), config);
    let source = EventSource::new(client, resync_interval);

    tokio::select! {
        served = liveness::serve(liveness_addr) => {
            served?;
            Err(CliError::Other {
                message: "liveness listener stopped".to_string(),
            })
        }
        watched = source.run(&reconciler, shutdown_signal()) => {
            if let Err(e) = &watched {
                tracing::error!(error = %e, "Stopping on fatal error");
            }
            Ok(watched?)
        }
    }
}

/// Completes on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Unable to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received ctrl-c"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
