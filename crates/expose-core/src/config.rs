//! Exposure configuration record
//!
//! The controller is configured through a small ConfigMap in its own
//! namespace. `domain` and `expose-rule` are required; the resync interval
//! is optional and falls back to [`DEFAULT_RESYNC_INTERVAL`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::config_keys;
use crate::error::{CoreError, Result};

/// Resync interval used when the ConfigMap does not set a valid one
pub const DEFAULT_RESYNC_INTERVAL: Duration = Duration::from_millis(5000);

/// The mechanism used to make a service reachable from outside the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExposeStrategy {
    /// Kubernetes Ingress rule
    Ingress,
    /// OpenShift Route
    Route,
    /// Convert the service to `NodePort`
    NodePort,
    /// Convert the service to `LoadBalancer`
    LoadBalancer,
}

impl ExposeStrategy {
    pub const ALL: [ExposeStrategy; 4] = [
        ExposeStrategy::Ingress,
        ExposeStrategy::Route,
        ExposeStrategy::NodePort,
        ExposeStrategy::LoadBalancer,
    ];

    /// Name as written in the `expose-rule` ConfigMap key
    pub fn as_str(&self) -> &'static str {
        match self {
            ExposeStrategy::Ingress => "ingress",
            ExposeStrategy::Route => "route",
            ExposeStrategy::NodePort => "node-port",
            ExposeStrategy::LoadBalancer => "load-balancer",
        }
    }
}

impl fmt::Display for ExposeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExposeStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        ExposeStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s.trim())
            .ok_or_else(|| CoreError::UnknownStrategy {
                value: s.to_string(),
            })
    }
}

/// Resolved exposure configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExposureConfig {
    /// Domain suffix appended to `<service>.<namespace>.`
    pub domain: String,

    /// Selected exposure strategy
    pub strategy: ExposeStrategy,

    /// Resync interval in milliseconds
    pub resync_interval_ms: u64,
}

impl ExposureConfig {
    /// Parse the configuration from ConfigMap data
    ///
    /// `source` names the ConfigMap and is only used in error messages.
    pub fn from_data(source: &str, data: &BTreeMap<String, String>) -> Result<Self> {
        let domain = data
            .get(config_keys::DOMAIN)
            .map(|d| d.trim())
            .filter(|d| !d.is_empty())
            .ok_or_else(|| CoreError::MissingKey {
                name: source.to_string(),
                key: config_keys::DOMAIN.to_string(),
            })?;

        let strategy = data
            .get(config_keys::EXPOSE_RULE)
            .ok_or_else(|| CoreError::MissingKey {
                name: source.to_string(),
                key: config_keys::EXPOSE_RULE.to_string(),
            })?
            .parse()?;

        Ok(Self {
            domain: domain.to_string(),
            strategy,
            resync_interval_ms: parse_resync_interval(data).as_millis() as u64,
        })
    }

    pub fn resync_interval(&self) -> Duration {
        Duration::from_millis(self.resync_interval_ms)
    }
}

/// Read `watch-rate-milliseconds`, defaulting to 5 seconds
///
/// A value that does not parse as a positive integer is logged and replaced
/// by the default.
pub fn parse_resync_interval(data: &BTreeMap<String, String>) -> Duration {
    let Some(raw) = data.get(config_keys::WATCH_RATE) else {
        return DEFAULT_RESYNC_INTERVAL;
    };

    match raw.trim().parse::<u64>() {
        Ok(0) => {
            tracing::warn!(
                value = %raw,
                "{} must be greater than zero, using default",
                config_keys::WATCH_RATE
            );
            DEFAULT_RESYNC_INTERVAL
        }
        Ok(ms) => Duration::from_millis(ms),
        Err(e) => {
            tracing::warn!(
                value = %raw,
                error = %e,
                "Error parsing {}, using default",
                config_keys::WATCH_RATE
            );
            DEFAULT_RESYNC_INTERVAL
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_strategy_round_trip_names() {
        for strategy in ExposeStrategy::ALL {
            assert_eq!(strategy.as_str().parse::<ExposeStrategy>().unwrap(), strategy);
        }
        assert_eq!(ExposeStrategy::NodePort.to_string(), "node-port");
    }

    #[test]
    fn test_strategy_unknown() {
        let err = "nodeport".parse::<ExposeStrategy>().unwrap_err();
        assert_eq!(
            err,
            CoreError::UnknownStrategy {
                value: "nodeport".to_string()
            }
        );
    }

    #[test]
    fn test_strategy_serde_kebab_case() {
        let json = serde_json::to_string(&ExposeStrategy::LoadBalancer).unwrap();
        assert_eq!(json, "\"load-balancer\"");
    }

    #[test]
    fn test_from_data_complete() {
        let config = ExposureConfig::from_data(
            "exposecontroller",
            &data(&[
                ("domain", "example.com"),
                ("expose-rule", "ingress"),
                ("watch-rate-milliseconds", "2000"),
            ]),
        )
        .unwrap();

        assert_eq!(config.domain, "example.com");
        assert_eq!(config.strategy, ExposeStrategy::Ingress);
        assert_eq!(config.resync_interval(), Duration::from_millis(2000));
    }

    #[test]
    fn test_from_data_missing_domain() {
        let err = ExposureConfig::from_data("exposecontroller", &data(&[("expose-rule", "route")]))
            .unwrap_err();
        assert!(matches!(err, CoreError::MissingKey { ref key, .. } if key == "domain"));
    }

    #[test]
    fn test_from_data_blank_domain_is_missing() {
        let err = ExposureConfig::from_data(
            "exposecontroller",
            &data(&[("domain", "  "), ("expose-rule", "route")]),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::MissingKey { .. }));
    }

    #[test]
    fn test_from_data_missing_rule() {
        let err = ExposureConfig::from_data("exposecontroller", &data(&[("domain", "a.io")]))
            .unwrap_err();
        assert!(matches!(err, CoreError::MissingKey { ref key, .. } if key == "expose-rule"));
    }

    #[test]
    fn test_from_data_unknown_rule() {
        let err = ExposureConfig::from_data(
            "exposecontroller",
            &data(&[("domain", "a.io"), ("expose-rule", "magic")]),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::UnknownStrategy { .. }));
    }

    #[test]
    fn test_resync_interval_default_when_absent() {
        assert_eq!(parse_resync_interval(&data(&[])), DEFAULT_RESYNC_INTERVAL);
    }

    #[test]
    fn test_resync_interval_default_when_unparsable() {
        let d = data(&[("watch-rate-milliseconds", "soon")]);
        assert_eq!(parse_resync_interval(&d), DEFAULT_RESYNC_INTERVAL);

        let d = data(&[("watch-rate-milliseconds", "0")]);
        assert_eq!(parse_resync_interval(&d), DEFAULT_RESYNC_INTERVAL);
    }
}
