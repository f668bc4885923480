//! Standard exit codes for the controller process

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Configuration error - missing or invalid exposecontroller ConfigMap
pub const CONFIG_ERROR: i32 = 2;

/// Cluster error - unable to reach or authenticate to the API server
pub const CLUSTER_ERROR: i32 = 3;

/// IO error - liveness listener could not bind, etc.
pub const IO_ERROR: i32 = 5;
