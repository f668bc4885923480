//! Expose Core - Cluster-agnostic types for exposecontroller
//!
//! This crate provides the foundational types shared by the controller:
//! - `ExposeStrategy`: The external-access mechanism (ingress, route, node-port, load-balancer)
//! - `ExposureConfig`: The keyed configuration record read from the operating namespace
//! - `ServiceKey`: Service identity, including tombstone key parsing
//! - `labels`: Typed access to the exposure label
//! - `url`: Scheme inference and external URL construction

pub mod config;
pub mod constants;
pub mod error;
pub mod key;
pub mod labels;
pub mod url;

pub use config::{DEFAULT_RESYNC_INTERVAL, ExposeStrategy, ExposureConfig, parse_resync_interval};
pub use error::{CoreError, Result};
pub use key::ServiceKey;
pub use labels::{exposure_requested, exposure_withdrawn, has_exposure_label};
pub use url::{expose_url, infer_scheme};
