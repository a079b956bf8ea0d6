//! Relay receiver.
//!
//! Accepts the links posted by the watcher and forwards each one to a chat
//! webhook with a role mention. The last accepted post is kept in memory and
//! exposed on `GET /latest`.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header::CONTENT_TYPE, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::RwLock;

use crate::config::RelayConfig;
use crate::error::{Result, WatchError};

/// Webhook request timeout in seconds.
const WEBHOOK_TIMEOUT_SECS: u64 = 15;

/// The most recently accepted post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestPost {
    /// Posted text, usually a status link.
    pub text: String,
    /// When it was accepted (RFC 3339, UTC).
    pub updated_at: String,
}

/// Shared state for relay handlers.
pub struct RelayState {
    client: Client,
    webhook_url: String,
    role_id: String,
    message: String,
    latest: RwLock<Option<LatestPost>>,
}

impl RelayState {
    /// Create relay state from the relay configuration.
    pub fn new(config: &RelayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(WEBHOOK_TIMEOUT_SECS))
            .build()
            .map_err(|e| WatchError::Internal(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            webhook_url: config.webhook_url.clone(),
            role_id: config.role_id.clone(),
            message: config.message.clone(),
            latest: RwLock::new(None),
        })
    }

    /// Build the chat message for a posted text.
    pub fn format_content(&self, text: &str) -> String {
        if self.role_id.is_empty() {
            format!("{}\n{}", self.message, text)
        } else {
            format!("<@&{}> {}\n{}", self.role_id, self.message, text)
        }
    }

    /// Get the latest accepted post.
    pub async fn latest(&self) -> Option<LatestPost> {
        self.latest.read().await.clone()
    }
}

/// Create the relay router.
pub fn create_router(state: Arc<RelayState>) -> Router {
    Router::new()
        .route("/", post(receive_post))
        .route("/latest", get(latest_post))
        .with_state(state)
}

/// Pull the posted text out of a plain-text or `{"text": ...}` JSON body.
fn extract_text(headers: &HeaderMap, body: &str) -> String {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("json"))
        .unwrap_or(false);

    if !is_json {
        return body.to_string();
    }

    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("text").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default()
}

/// POST / - Accept a post and forward it to the webhook.
async fn receive_post(
    State(state): State<Arc<RelayState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let text = extract_text(&headers, &body);
    if text.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "empty text" }))).into_response();
    }

    let post = LatestPost {
        text,
        updated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    *state.latest.write().await = Some(post.clone());

    let payload = json!({
        "content": state.format_content(&post.text),
        "allowed_mentions": { "parse": ["roles"] },
    });

    let response = match state
        .client
        .post(&state.webhook_url)
        .json(&payload)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Webhook request failed: {}", e);
            return (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "discord webhook error", "detail": e.to_string() })),
            )
                .into_response();
        }
    };

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!("Webhook returned {}: {}", status, body);
        return (
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "error": "discord webhook failed",
                "status": status.as_u16(),
                "body": body,
            })),
        )
            .into_response();
    }

    tracing::info!("Forwarded {}", post.text);
    (
        StatusCode::CREATED,
        Json(json!({ "ok": true, "text": post.text, "updatedAt": post.updated_at })),
    )
        .into_response()
}

/// GET /latest - Return the latest accepted post.
async fn latest_post(State(state): State<Arc<RelayState>>) -> Response {
    match state.latest().await {
        Some(post) => Json(post).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Relay HTTP server.
pub struct RelayServer {
    addr: SocketAddr,
    state: Arc<RelayState>,
}

impl RelayServer {
    /// Create a relay server from configuration.
    pub fn new(config: &RelayConfig) -> Result<Self> {
        let addr = format!("{}:{}", config.host, config.port)
            .parse::<SocketAddr>()
            .map_err(|e| WatchError::Config(format!("invalid relay address: {e}")))?;

        Ok(Self {
            addr,
            state: Arc::new(RelayState::new(config)?),
        })
    }

    /// Serve until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.addr).await?;
        tracing::info!("Relay listening on http://{}", listener.local_addr()?);

        axum::serve(listener, create_router(self.state))
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}
