//! Integration tests for the exposecontroller binary

use std::process::Command;

/// Run exposecontroller with no reachable cluster
fn exposecontroller(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_exposecontroller"))
        .args(args)
        .env("KUBECONFIG", "/nonexistent/exposecontroller/kubeconfig")
        .env("HOME", "/nonexistent/exposecontroller")
        .env_remove("KUBERNETES_SERVICE_HOST")
        .env_remove("KUBERNETES_SERVICE_PORT")
        .env_remove("KUBERNETES_NAMESPACE")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute exposecontroller")
}

#[test]
fn test_help_lists_commands() {
    let output = exposecontroller(&["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("run"));
    assert!(stdout.contains("check"));
    assert!(stdout.contains("--namespace"));
}

#[test]
fn test_version() {
    let output = exposecontroller(&["--version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_run_help_shows_liveness_default() {
    let output = exposecontroller(&["run", "--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0.0.0.0:8080"));
}

#[test]
fn test_invalid_log_format_is_rejected() {
    let output = exposecontroller(&["--log-format", "xml", "check"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("xml"));
}

#[test]
fn test_invalid_liveness_addr_is_rejected() {
    let output = exposecontroller(&["run", "--liveness-addr", "not-an-address"]);

    assert!(!output.status.success());
}

#[test]
fn test_check_without_cluster_fails_with_cluster_exit_code() {
    let output = exposecontroller(&["check", "--namespace", "fabric8"]);

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Cluster error"));
}
