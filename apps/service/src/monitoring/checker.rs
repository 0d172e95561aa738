use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use super::clock::Clock;
use super::types::CheckResult;

/// Fixed per-check timeout unless configured otherwise
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Performs one check against a url.
///
/// Network-level failures are data, not errors: they come back as a
/// `CheckOutcome::Failure` so one bad target cannot abort a tick.
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    async fn check(&self, url: &str, timeout: Duration) -> CheckResult;
}

/// Single GET, no retries, body never read.
pub struct HttpChecker {
    client: reqwest::Client,
    clock: Arc<dyn Clock>,
}

impl HttpChecker {
    pub fn new(clock: Arc<dyn Clock>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("keepalive/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_client(client, clock))
    }

    pub fn with_client(client: reqwest::Client, clock: Arc<dyn Clock>) -> Self {
        Self { client, clock }
    }
}

#[async_trait::async_trait]
impl Checker for HttpChecker {
    async fn check(&self, url: &str, timeout: Duration) -> CheckResult {
        let timestamp = self.clock.now();

        match self.client.get(url).timeout(timeout).send().await {
            Ok(response) => CheckResult::success(timestamp, response.status().as_u16()),
            Err(e) if e.is_timeout() => {
                CheckResult::failure(timestamp, format!("timeout of {}ms exceeded", timeout.as_millis()))
            }
            Err(e) => CheckResult::failure(timestamp, describe_error(&e)),
        }
    }
}

/// Flatten an error and its sources into one line, reqwest's top-level
/// message alone rarely says what went wrong.
fn describe_error(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::clock::SystemClock;
    use crate::monitoring::types::CheckOutcome;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn checker() -> HttpChecker {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        HttpChecker::with_client(client, Arc::new(SystemClock))
    }

    /// Serve `responses` canned replies on a random local port
    async fn canned_server(reply: &'static str, responses: usize) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            for _ in 0..responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                socket.write_all(reply.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });

        format!("http://{addr}/health")
    }

    #[tokio::test]
    async fn test_ok_response_is_success() {
        let url = canned_server("HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok", 1).await;

        let result = checker().check(&url, Duration::from_secs(5)).await;
        assert_eq!(result.outcome, CheckOutcome::Success { status_code: 200 });
    }

    #[tokio::test]
    async fn test_server_error_is_recorded_not_failed() {
        let url = canned_server("HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n", 1)
            .await;

        let result = checker().check(&url, Duration::from_secs(5)).await;
        assert_eq!(result.outcome, CheckOutcome::Success { status_code: 503 });
    }

    #[tokio::test]
    async fn test_connection_refused_is_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = checker().check(&format!("http://{addr}/"), Duration::from_secs(5)).await;
        assert_eq!(result.outcome.status_code(), None);
        assert!(!result.outcome.error().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hanging_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hold = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let result = checker().check(&format!("http://{addr}/"), Duration::from_millis(200)).await;
        assert_eq!(result.outcome, CheckOutcome::Failure { message: "timeout of 200ms exceeded".into() });
        hold.abort();
    }
}
