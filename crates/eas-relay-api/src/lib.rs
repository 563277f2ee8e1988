//! # EAS Relay HTTP Service
//!
//! HTTP server for receiving Expo EAS build/submission webhooks and relaying
//! them to a Slack channel.
//!
//! This service provides:
//! - `POST /build` and `POST /submit` webhook endpoints with signature
//!   validation over the raw body
//! - `GET /version` static version endpoint
//! - `GET /health` liveness endpoint
//!
//! The relay is best-effort by design: once a webhook authenticates and
//! parses, the caller gets `200 OK!` even when the outbound Slack post
//! fails. EAS retries nothing either way, and a lost notification costs a
//! Slack message, not data.

// Public modules
pub mod slack;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod lib_tests;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use eas_relay_core::{
    event::{BuildPayload, SubmissionPayload},
    message::{format_build, format_submission, ChatMessage},
    signature::WebhookAuthenticator,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use slack::{RelayOutcome, SlackNotifier};
use std::{net::SocketAddr, sync::Arc};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, instrument, warn};

/// Header carrying the HMAC-SHA1 signature of the request body.
pub const SIGNATURE_HEADER: &str = "expo-signature";

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: ServiceConfig,

    /// Authenticator for inbound webhook signatures
    pub authenticator: Arc<WebhookAuthenticator>,

    /// Outbound notifier for the Slack channel
    pub notifier: Arc<dyn SlackNotifier>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        config: ServiceConfig,
        authenticator: Arc<WebhookAuthenticator>,
        notifier: Arc<dyn SlackNotifier>,
    ) -> Self {
        Self {
            config,
            authenticator,
            notifier,
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Service configuration
///
/// Constructed once at startup and passed by reference through [`AppState`];
/// there is no process-global configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Relay settings (Slack target, channel, webhook secret)
    pub relay: RelayConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Validate the configuration.
    ///
    /// The webhook secret and the Slack webhook URL have no usable
    /// defaults; a configuration missing either is a startup-time error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.relay.webhook_secret.is_empty() {
            return Err(ConfigError::Missing {
                key: "relay.webhook_secret (SECRET_WEBHOOK_KEY)".to_string(),
            });
        }

        if self.relay.slack_webhook_url.is_empty() {
            return Err(ConfigError::Missing {
                key: "relay.slack_webhook_url (SLACK_WEBHOOK_URL)".to_string(),
            });
        }

        if !self.relay.slack_webhook_url.starts_with("http") {
            return Err(ConfigError::Invalid {
                message: format!(
                    "relay.slack_webhook_url is not an HTTP URL: {}",
                    self.relay.slack_webhook_url
                ),
            });
        }

        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                message: "server.port must be non-zero".to_string(),
            });
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_seconds: 30,
        }
    }
}

/// Relay configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Slack incoming-webhook URL to post messages to
    pub slack_webhook_url: String,

    /// Channel the messages are addressed to
    pub channel: String,

    /// Shared secret EAS signs webhook bodies with
    pub webhook_secret: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            slack_webhook_url: String::new(),
            channel: "#4-productdev_software".to_string(),
            webhook_secret: String::new(),
        }
    }
}

// Security: never expose the secret or the webhook URL (it embeds a token)
// in debug output.
impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("slack_webhook_url", &"<REDACTED>")
            .field("channel", &self.channel)
            .field("webhook_secret", &"<REDACTED>")
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let webhook_routes = Router::new()
        .route("/build", post(handle_build))
        .route("/submit", post(handle_submit));

    let health_routes = Router::new()
        .route("/version", get(handle_version))
        .route("/health", get(handle_health));

    Router::new()
        .merge(webhook_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_logging_middleware))
                .into_inner(),
        )
        .with_state(state)
}

/// Start HTTP server
pub async fn start_server(state: AppState) -> Result<(), ServiceError> {
    let host = state.config.server.host.clone();
    let port = state.config.server.port;
    let shutdown_timeout =
        std::time::Duration::from_secs(state.config.server.shutdown_timeout_seconds);

    let app = create_router(state);

    let addr: SocketAddr =
        format!("{}:{}", host, port)
            .parse()
            .map_err(|e| ServiceError::BindFailed {
                address: format!("{}:{}", host, port),
                message: format!("invalid bind address: {}", e),
            })?;

    let listener =
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServiceError::BindFailed {
                address: addr.to_string(),
                message: e.to_string(),
            })?;

    info!("Starting HTTP server on {}", addr);

    let shutdown_signal = async move {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C signal handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
            },
            _ = terminate => {
                info!("Received SIGTERM, initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
            },
        }
    };

    // In-flight requests are allowed to complete; new connections are
    // refused as soon as the shutdown signal fires.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })?;

    info!("HTTP server shutdown complete");
    Ok(())
}

// ============================================================================
// Webhook Handlers
// ============================================================================

/// Handle EAS build lifecycle webhooks.
///
/// The sequence per request:
/// 1. Verify the `expo-signature` header over the raw body bytes
/// 2. Parse the body as a build payload
/// 3. Format the chat message and post it to Slack
/// 4. Acknowledge with `200 OK!` — even when the Slack post failed
#[instrument(skip(state, headers, body))]
pub async fn handle_build(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookHandlerError> {
    let payload: BuildPayload = authenticate_and_parse(&state, &headers, &body)?;

    info!(
        build_id = %payload.id,
        project = %payload.project_name,
        status = %payload.status,
        "Received build webhook"
    );

    relay_message(&state, format_build(&payload)).await;
    Ok((StatusCode::OK, "OK!"))
}

/// Handle EAS store submission lifecycle webhooks.
///
/// Same sequence as [`handle_build`], with the submission payload shape.
#[instrument(skip(state, headers, body))]
pub async fn handle_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookHandlerError> {
    let payload: SubmissionPayload = authenticate_and_parse(&state, &headers, &body)?;

    info!(
        submission_id = %payload.id,
        project = %payload.project_name,
        status = %payload.status,
        "Received submission webhook"
    );

    relay_message(&state, format_submission(&payload)).await;
    Ok((StatusCode::OK, "OK!"))
}

/// Verify the signature over the raw body, then parse the payload.
///
/// Order matters: verification runs over the bytes exactly as received,
/// before any JSON parsing. A missing or malformed signature header is
/// rejected the same way as a digest mismatch.
fn authenticate_and_parse<T: DeserializeOwned>(
    state: &AppState,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<T, WebhookHandlerError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            warn!("Webhook rejected: missing {} header", SIGNATURE_HEADER);
            WebhookHandlerError::SignatureRejected
        })?;

    state.authenticator.verify(body, signature).map_err(|e| {
        warn!(error = %e, "Webhook rejected: signature verification failed");
        WebhookHandlerError::SignatureRejected
    })?;

    serde_json::from_slice(body).map_err(|e| WebhookHandlerError::MalformedPayload {
        message: e.to_string(),
    })
}

/// Post the message to Slack, logging and swallowing delivery failures.
///
/// The inbound caller is acknowledged regardless: the delivery guarantee
/// ends at "received and attempted to relay".
async fn relay_message(state: &AppState, message: ChatMessage) {
    match state.notifier.notify(&message).await {
        RelayOutcome::Delivered => {
            info!(title = %message.title, "Relayed message to Slack");
        }
        RelayOutcome::Failed { reason } => {
            error!(
                title = %message.title,
                reason = %reason,
                "Failed to relay message to Slack; notification dropped"
            );
        }
    }
}

// ============================================================================
// Health Handlers
// ============================================================================

/// Static version endpoint
async fn handle_version() -> Json<VersionResponse> {
    Json(VersionResponse { version: "1.0.0" })
}

/// Liveness endpoint
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

// ============================================================================
// Middleware
// ============================================================================

/// Request logging middleware with correlation ID tracking
///
/// This middleware:
/// - Extracts or generates correlation IDs for request tracking
/// - Logs request start and completion with structured fields
/// - Propagates correlation ID through response headers
#[instrument(skip(request, next), fields(
    method = %request.method(),
    uri = %request.uri(),
    correlation_id
))]
async fn request_logging_middleware(
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let correlation_id = request
        .headers()
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::Span::current().record("correlation_id", correlation_id.as_str());
    request.extensions_mut().insert(correlation_id.clone());

    let mut response = next.run(request).await;
    let duration = start.elapsed();

    if let Ok(header_value) = correlation_id.parse() {
        response
            .headers_mut()
            .insert("x-correlation-id", header_value);
    }

    let status = response.status();

    if status.is_server_error() {
        error!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with server error"
        );
    } else if status.is_client_error() {
        warn!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        info!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed successfully"
        );
    }

    response
}

// ============================================================================
// Response Types
// ============================================================================

/// Version response
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
}

/// Liveness response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

// ============================================================================
// Error Types
// ============================================================================

/// Webhook handler errors with HTTP status code mapping
///
/// Mapping:
/// - Signature rejection → `500` with the fixed body `Signatures didn't
///   match!` — the exact contract the EAS webhook integration was built
///   against, kept for wire compatibility even though a 4xx would be the
///   conventional choice
/// - Malformed payload → `400 Bad Request` with a plain-text reason
///
/// Response bodies never contain secret or digest material.
#[derive(Debug, thiserror::Error)]
pub enum WebhookHandlerError {
    /// The `expo-signature` header was missing, malformed, or did not
    /// match the request body.
    #[error("signature verification failed")]
    SignatureRejected,

    /// The body passed signature verification but does not parse as the
    /// expected payload shape.
    #[error("malformed payload: {message}")]
    MalformedPayload { message: String },
}

impl IntoResponse for WebhookHandlerError {
    fn into_response(self) -> Response {
        match self {
            Self::SignatureRejected => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Signatures didn't match!",
            )
                .into_response(),
            Self::MalformedPayload { message } => (
                StatusCode::BAD_REQUEST,
                format!("Invalid payload: {}", message),
            )
                .into_response(),
        }
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },
}
