//! Readiness check for the mock server.
//!
//! Any HTTP response counts as ready: the mock answers unknown paths with
//! 404, which still proves it is listening and serving.

use crate::config::MockServerSettings;
use crate::error::{Result, ServiceError};
use std::time::Duration;
use sysinfo::System;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Per-request budget; a hung connection must not eat the whole timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Address injected as `CONNECT_SERVER`, e.g. `http://buildhost:3939`.
///
/// Uses the configured host, falling back to the local hostname.
pub fn server_address(settings: &MockServerSettings) -> Result<String> {
    let host = settings
        .host
        .clone()
        .or_else(System::host_name)
        .unwrap_or_else(|| "localhost".to_string());
    let address = format!("http://{}:{}", host, settings.port);

    Url::parse(&address).map_err(|source| ServiceError::InvalidUrl {
        url: address.clone(),
        source,
    })?;
    Ok(address)
}

/// Poll `address` until it answers, the timeout passes, or `cancel` fires.
///
/// Returns how long the server took to become ready.
pub async fn wait_until_ready(
    address: &str,
    timeout: Duration,
    interval: Duration,
    cancel: &CancellationToken,
) -> Result<Duration> {
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT.min(timeout.max(Duration::from_millis(100))))
        .no_proxy()
        .build()
        .map_err(|e| ServiceError::Probe {
            reason: e.to_string(),
        })?;

    let started = Instant::now();
    let deadline = started + timeout;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let attempt = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(cancelled());
            }
            response = client.get(address).send() => response,
        };

        match attempt {
            Ok(response) => {
                log::debug!(
                    "Mock server answered {} after {} attempt(s)",
                    response.status(),
                    attempts
                );
                return Ok(started.elapsed());
            }
            Err(e) => log::debug!("Mock server not ready (attempt {}): {}", attempts, e),
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(ServiceError::NotReady {
                url: address.to_string(),
                waited_ms: started.elapsed().as_millis(),
            }
            .into());
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled()),
            _ = tokio::time::sleep(interval.min(deadline - now)) => {}
        }
    }
}

fn cancelled() -> crate::error::ReleaseError {
    ServiceError::Cancelled {
        during: "waiting for the mock server".to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReleaseError;
    use crate::mock_server::testing::spawn_http_stub;
    use tokio::net::TcpListener;

    async fn unused_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn test_server_address_uses_configured_host() {
        let settings = MockServerSettings {
            host: Some("buildhost".to_string()),
            ..MockServerSettings::default()
        };
        assert_eq!(server_address(&settings).unwrap(), "http://buildhost:3939");
    }

    #[test]
    fn test_server_address_falls_back_to_hostname() {
        let address = server_address(&MockServerSettings::default()).unwrap();
        assert!(address.starts_with("http://"));
        assert!(address.ends_with(":3939"));
    }

    #[tokio::test]
    async fn test_ready_when_server_answers() {
        let port = spawn_http_stub().await;
        let address = format!("http://127.0.0.1:{}", port);
        let waited = wait_until_ready(
            &address,
            Duration::from_secs(5),
            Duration::from_millis(20),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert!(waited < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_times_out_when_nothing_listens() {
        let address = format!("http://127.0.0.1:{}", unused_port().await);
        let err = wait_until_ready(
            &address,
            Duration::from_millis(200),
            Duration::from_millis(20),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::Service(ServiceError::NotReady { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancellation_stops_polling() {
        let address = format!("http://127.0.0.1:{}", unused_port().await);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = wait_until_ready(
            &address,
            Duration::from_secs(30),
            Duration::from_millis(20),
            &cancel,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::Service(ServiceError::Cancelled { .. })
        ));
    }
}
