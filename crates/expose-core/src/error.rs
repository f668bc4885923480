//! Core error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("ConfigMap '{name}' has no '{key}' entry")]
    MissingKey { name: String, key: String },

    #[error("unknown expose-rule '{value}' (expected one of ingress, route, node-port, load-balancer)")]
    UnknownStrategy { value: String },

    #[error("malformed service key '{key}' (expected 'namespace/name')")]
    MalformedKey { key: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
