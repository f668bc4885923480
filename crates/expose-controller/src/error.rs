//! CLI error types with exit code handling

use expose_kube::ExposeError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// Controller error carrying its exit code
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Missing or invalid exposure configuration
    #[error("Configuration error: {message}")]
    #[diagnostic(code(exposecontroller::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// The API server could not be reached
    #[error("Cluster error: {message}")]
    #[diagnostic(
        code(exposecontroller::cluster),
        help("check the kubeconfig context or the in-cluster service account")
    )]
    Cluster { message: String },

    /// IO error (listener bind, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(exposecontroller::io))]
    Io { message: String },

    /// Anything else
    #[error("{message}")]
    #[diagnostic(code(exposecontroller::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Cluster { .. } => exit_codes::CLUSTER_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    pub fn config(message: impl Into<String>, help: Option<String>) -> Self {
        Self::Config {
            message: message.into(),
            help,
        }
    }

    /// Failure to build a client or talk to the API server
    pub fn cluster(err: impl std::fmt::Display) -> Self {
        Self::Cluster {
            message: err.to_string(),
        }
    }
}

impl From<ExposeError> for CliError {
    fn from(err: ExposeError) -> Self {
        let message = err.to_string();
        if err.is_fatal() {
            return CliError::Config {
                message,
                help: None,
            };
        }
        match err {
            ExposeError::Api(_) => CliError::Cluster { message },
            ExposeError::PlatformMismatch { hint, .. } => CliError::Config {
                message,
                help: Some(hint),
            },
            _ => CliError::Other { message },
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use expose_core::CoreError;

    #[test]
    fn test_fatal_errors_map_to_config_exit_code() {
        let err: CliError = ExposeError::MissingConfig {
            name: "exposecontroller".to_string(),
            namespace: "fabric8".to_string(),
            source: None,
        }
        .into();
        assert_eq!(err.exit_code(), exit_codes::CONFIG_ERROR);

        let err: CliError = ExposeError::MalformedDelete(CoreError::MalformedKey {
            key: "foo".to_string(),
        })
        .into();
        assert_eq!(err.exit_code(), exit_codes::CONFIG_ERROR);
    }

    #[test]
    fn test_platform_mismatch_carries_hint() {
        let err: CliError = ExposeError::PlatformMismatch {
            strategy: "route".to_string(),
            platform: "Kubernetes".to_string(),
            hint: "please use ingress".to_string(),
        }
        .into();

        match err {
            CliError::Config { help, .. } => {
                assert_eq!(help.as_deref(), Some("please use ingress"))
            }
            other => panic!("expected Config, got {other:?}"),
        }
    }

    #[test]
    fn test_io_error_exit_code() {
        let err: CliError = std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use").into();
        assert_eq!(err.exit_code(), exit_codes::IO_ERROR);
    }
}
