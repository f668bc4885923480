//! Configuration resolver
//!
//! Reads the exposure ConfigMap from the controller's namespace. The record
//! is re-read on every reconciliation so the strategy can change without a
//! restart; a missing record or domain is fatal.

use expose_core::constants::CONFIG_MAP_NAME;
use expose_core::{ExposureConfig, parse_resync_interval};
use std::time::Duration;

use crate::cluster::ClusterApi;
use crate::error::{ExposeError, Result};

/// Locates and parses the exposure configuration record
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    namespace: String,
    name: String,
}

impl ConfigResolver {
    /// Resolver for the default ConfigMap name in `namespace`
    pub fn new(namespace: impl Into<String>) -> Self {
        Self::with_name(namespace, CONFIG_MAP_NAME)
    }

    pub fn with_name(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read and validate the configuration
    pub async fn resolve(&self, cluster: &dyn ClusterApi) -> Result<ExposureConfig> {
        let data = self.read_data(cluster).await?;
        ExposureConfig::from_data(&self.name, &data).map_err(|source| {
            ExposeError::InvalidConfig {
                namespace: self.namespace.clone(),
                source,
            }
        })
    }

    /// Read the resync interval, defaulting to 5 seconds
    ///
    /// Only the record itself is required here; `domain` is checked on each
    /// reconciliation.
    pub async fn resync_interval(&self, cluster: &dyn ClusterApi) -> Result<Duration> {
        let data = self.read_data(cluster).await?;
        Ok(parse_resync_interval(&data))
    }

    async fn read_data(
        &self,
        cluster: &dyn ClusterApi,
    ) -> Result<std::collections::BTreeMap<String, String>> {
        let missing = |source| ExposeError::MissingConfig {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            source,
        };

        match cluster.get_config_map(&self.namespace, &self.name).await {
            Ok(Some(config_map)) => Ok(config_map.data.unwrap_or_default()),
            Ok(None) => Err(missing(None)),
            Err(ExposeError::Api(e)) => Err(missing(Some(e))),
            Err(e) => Err(e),
        }
    }
}
