//! Well-known names shared with the cluster
//!
//! These values are part of the controller's external contract: other tools
//! read the annotation, and operators write the ConfigMap keys.

/// Name of the ConfigMap holding the exposure configuration
pub const CONFIG_MAP_NAME: &str = "exposecontroller";

/// ConfigMap keys
pub mod config_keys {
    /// Domain suffix used to build hostnames (required)
    pub const DOMAIN: &str = "domain";
    /// Exposure strategy name (required)
    pub const EXPOSE_RULE: &str = "expose-rule";
    /// Resync interval in milliseconds (optional)
    pub const WATCH_RATE: &str = "watch-rate-milliseconds";
}

/// Label key signalling exposure intent
pub const EXPOSE_LABEL_KEY: &str = "expose";
/// Label value signalling exposure intent
pub const EXPOSE_LABEL_VALUE: &str = "true";
/// Label value explicitly disabling exposure
pub const EXPOSE_LABEL_DISABLED: &str = "false";

/// Annotation written onto exposed services with their external URL
pub const EXPOSE_URL_ANNOTATION: &str = "fabric8.io/exposeUrl";

/// Node annotation carrying the node's public IP (node-port strategy)
pub const EXTERNAL_IP_ANNOTATION: &str = "kubernetes.io/externalIP";

/// Provider marker placed on ingresses and routes created by the controller
pub const PROVIDER_LABEL_KEY: &str = "provider";
pub const PROVIDER_LABEL_VALUE: &str = "fabric8";

/// The API server's own service, never routed
pub const KUBERNETES_SERVICE: &str = "kubernetes";
