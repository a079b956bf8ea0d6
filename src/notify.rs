//! Notification delivery.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

use crate::config::NotifyConfig;
use crate::error::{Result, WatchError};

/// Receiver of new-entry notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `link` downstream.
    ///
    /// An `Err` means the receiver did not accept it and the entry should be
    /// retried later.
    async fn notify(&self, link: &str) -> Result<()>;
}

/// Posts the link as a `text/plain` body to a fixed endpoint.
pub struct HttpNotifier {
    client: Client,
    endpoint: String,
}

impl HttpNotifier {
    /// Create a notifier from the notify configuration.
    pub fn new(config: &NotifyConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WatchError::Internal(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    /// The endpoint notifications are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, link: &str) -> Result<()> {
        debug!("Posting {} to {}", link, self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/plain")
            .body(link.to_string())
            .send()
            .await
            .map_err(|e| WatchError::Delivery(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WatchError::Delivery(format!(
                "receiver returned {}: {}",
                status,
                body.trim()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use tokio::net::TcpListener;

    type Received = Arc<Mutex<Vec<(String, String)>>>;

    async fn spawn_receiver(status: StatusCode) -> (SocketAddr, Received) {
        let received: Received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();

        let app = Router::new().route(
            "/",
            post(move |headers: HeaderMap, body: String| {
                let sink = sink.clone();
                async move {
                    let content_type = headers
                        .get("content-type")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    sink.lock().unwrap().push((content_type, body));
                    (status, "nope")
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (addr, received)
    }

    fn config_for(addr: SocketAddr) -> NotifyConfig {
        NotifyConfig {
            endpoint: format!("http://{addr}/"),
            timeout_secs: 5,
            ..NotifyConfig::default()
        }
    }

    #[tokio::test]
    async fn test_notify_posts_plain_text() {
        let (addr, received) = spawn_receiver(StatusCode::CREATED).await;
        let notifier = HttpNotifier::new(&config_for(addr)).unwrap();

        notifier
            .notify("https://x.com/YUY_IX/status/42")
            .await
            .unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].0, "text/plain");
        assert_eq!(received[0].1, "https://x.com/YUY_IX/status/42");
    }

    #[tokio::test]
    async fn test_notify_error_status_is_delivery_error() {
        let (addr, received) = spawn_receiver(StatusCode::BAD_GATEWAY).await;
        let notifier = HttpNotifier::new(&config_for(addr)).unwrap();

        let err = notifier.notify("link").await.unwrap_err();
        assert!(matches!(err, WatchError::Delivery(_)));
        assert!(err.to_string().contains("502"));
        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_notify_unreachable_is_delivery_error() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let notifier = HttpNotifier::new(&config_for(addr)).unwrap();
        let err = notifier.notify("link").await.unwrap_err();
        assert!(matches!(err, WatchError::Delivery(_)));
    }

    #[test]
    fn test_notifier_new() {
        let notifier = HttpNotifier::new(&NotifyConfig::default()).unwrap();
        assert_eq!(notifier.endpoint(), "http://localhost:3000/");
    }
}
