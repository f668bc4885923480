//! External URL construction
//!
//! The scheme defaults to `http`. It becomes `https` when the host ends in a
//! well-known TLS port or when the service declares a port named `https`.

/// Ports treated as TLS when they appear as the host's port suffix
const TLS_PORTS: [&str; 2] = ["443", "8443"];

/// Port name that marks a service as speaking TLS
const HTTPS_PORT_NAME: &str = "https";

/// Pick `http` or `https` for a host
pub fn infer_scheme<'a>(host: &str, port_names: impl IntoIterator<Item = &'a str>) -> &'static str {
    let tls_port = host
        .rsplit_once(':')
        .is_some_and(|(_, port)| TLS_PORTS.contains(&port));

    if tls_port || port_names.into_iter().any(|name| name == HTTPS_PORT_NAME) {
        "https"
    } else {
        "http"
    }
}

/// Build `scheme://host[:port]` for a service
pub fn expose_url<'a>(host: &str, port_names: impl IntoIterator<Item = &'a str>) -> String {
    format!("{}://{}", infer_scheme(host, port_names), host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_port_suffix() {
        assert_eq!(expose_url("1.2.3.4:443", []), "https://1.2.3.4:443");
        assert_eq!(expose_url("1.2.3.4:8443", ["web"]), "https://1.2.3.4:8443");
    }

    #[test]
    fn test_plain_port() {
        assert_eq!(expose_url("1.2.3.4:8080", ["http"]), "http://1.2.3.4:8080");
    }

    #[test]
    fn test_port_named_https() {
        assert_eq!(
            expose_url("1.2.3.4:8080", ["http", "https"]),
            "https://1.2.3.4:8080"
        );
    }

    #[test]
    fn test_hostname_without_port() {
        assert_eq!(
            expose_url("foo.bar.example.com", []),
            "http://foo.bar.example.com"
        );
        assert_eq!(infer_scheme("foo.bar.example.com", ["https"]), "https");
    }

    #[test]
    fn test_port_suffix_must_match_exactly() {
        assert_eq!(infer_scheme("1.2.3.4:4430", []), "http");
    }
}
