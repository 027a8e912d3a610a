//! Auxiliary mock server used by integration tests of the managed tool.
//!
//! The server itself is defined elsewhere (`mock_connect/`); this module
//! starts and stops it and waits until it answers HTTP.

mod readiness;
mod service;

pub use readiness::{server_address, wait_until_ready};
pub use service::MockServer;

/// Variable carrying the mock server address into the test container
pub const CONNECT_SERVER: &str = "CONNECT_SERVER";

/// Variable carrying the placeholder credential into the test container
pub const CONNECT_API_KEY: &str = "CONNECT_API_KEY";

#[cfg(test)]
pub(crate) mod testing {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal HTTP server answering every request with 404
    pub(crate) async fn spawn_http_stub() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket
                        .write_all(
                            b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                        )
                        .await;
                });
            }
        });
        port
    }
}
