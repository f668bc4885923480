//! Check command - validate configuration against the connected cluster

use console::style;
use expose_core::ExposureConfig;
use expose_kube::{ClusterApi, ConfigResolver, ExposeError, Platform, Reconciler};
use serde::Serialize;
use std::sync::Arc;

use super::{ClusterOptions, connect, resolve_namespace};
use crate::error::{CliError, Result};

/// Result of a configuration check
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub namespace: String,
    pub config_map: String,
    #[serde(flatten)]
    pub config: ExposureConfig,
    pub platform: String,
    pub supported: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Run the check command
pub async fn run(options: &ClusterOptions, output_json: bool) -> Result<()> {
    let cluster = connect().await?;
    let namespace = resolve_namespace(options.namespace.as_deref(), &cluster);
    let resolver = ConfigResolver::with_name(&namespace, &options.config_name);

    let config = resolver.resolve(&cluster).await?;
    let platform = Platform::from_openshift(cluster.is_openshift().await?);

    let reconciler = Reconciler::new(Arc::new(cluster), resolver);
    let hint = match reconciler.check_platform(&config).await {
        Ok(()) => None,
        Err(ExposeError::PlatformMismatch { hint, .. }) => Some(hint),
        Err(e) => return Err(e.into()),
    };

    let report = CheckReport {
        namespace,
        config_map: options.config_name.clone(),
        config,
        platform: platform.to_string(),
        supported: hint.is_none(),
        hint,
    };

    if output_json {
        let json = serde_json::to_string_pretty(&report).map_err(|e| CliError::Other {
            message: e.to_string(),
        })?;
        println!("{}", json);
    } else {
        print_report(&report);
    }

    match &report.hint {
        None => Ok(()),
        Some(hint) => Err(CliError::config(
            format!(
                "expose-rule '{}' cannot be used on {}",
                report.config.strategy, report.platform
            ),
            Some(hint.clone()),
        )),
    }
}

fn print_report(report: &CheckReport) {
    println!("{}", style("CONFIGURATION").bold().underlined());
    println!(
        "  ConfigMap:  {}/{}",
        style(&report.namespace).yellow(),
        style(&report.config_map).cyan()
    );
    println!("  Domain:     {}", style(&report.config.domain).cyan());
    println!("  Rule:       {}", style(report.config.strategy).cyan());
    println!("  Resync:     {}ms", report.config.resync_interval_ms);

    println!("\n{}", style("CLUSTER").bold().underlined());
    println!("  Platform:   {}", report.platform);

    if report.supported {
        println!("\n{} Configuration is usable", style("✓").green().bold());
    } else {
        println!(
            "\n{} {}",
            style("✗").red().bold(),
            report.hint.as_deref().unwrap_or_default()
        );
    }
}
