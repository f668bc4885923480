//! Liveness listener
//!
//! Answers every request with an empty 200 so the kubelet can tell the
//! process is up.

use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;

fn router() -> Router {
    Router::new().fallback(|| async {})
}

/// Bind `addr` and serve until the future is dropped
pub async fn serve(addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_on(listener).await
}

pub async fn serve_on(listener: TcpListener) -> std::io::Result<()> {
    tracing::info!(addr = %listener.local_addr()?, "Liveness probe listening");
    axum::serve(listener, router()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn test_any_path_returns_ok() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve_on(listener));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /healthz HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
        server.abort();
    }
}
