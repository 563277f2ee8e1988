//! # Slack Delivery Module
//!
//! Posts formatted chat messages to a Slack incoming-webhook URL.
//!
//! Delivery is fire-and-forget: the relay's contract to the inbound caller
//! ends at "received and attempted". Failures come back as data in
//! [`RelayOutcome`] rather than as errors, which makes the best-effort
//! policy visible in the signature instead of buried in a swallowed
//! `Result`. No retries, no timeout beyond what reqwest applies, no
//! cancellation once the request is in flight.

use async_trait::async_trait;
use eas_relay_core::message::{ChatMessage, MessageColor};
use serde::Serialize;
use tracing::{debug, instrument};

// ============================================================================
// Outcome
// ============================================================================

/// Outcome of a single outbound delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Slack acknowledged the post with a 2xx status.
    Delivered,

    /// The post failed (network error or non-2xx status).
    Failed { reason: String },
}

impl RelayOutcome {
    /// Check whether the message reached Slack.
    pub fn is_delivered(&self) -> bool {
        matches!(self, RelayOutcome::Delivered)
    }
}

// ============================================================================
// Notifier Trait
// ============================================================================

/// Interface for posting chat messages to the team channel.
///
/// The trait exists so tests can substitute a recording mock for the
/// HTTP-backed client.
#[async_trait]
pub trait SlackNotifier: Send + Sync {
    /// Post a message, reporting the outcome without ever failing the
    /// caller.
    async fn notify(&self, message: &ChatMessage) -> RelayOutcome;
}

// ============================================================================
// Wire Types
// ============================================================================

/// Request body for the Slack incoming-webhook API.
#[derive(Debug, Serialize)]
struct SlackWebhookRequest<'a> {
    channel: &'a str,
    text: &'a str,
    attachments: [SlackAttachment<'a>; 1],
}

/// A single colored attachment carrying the message body.
#[derive(Debug, Serialize)]
struct SlackAttachment<'a> {
    color: MessageColor,
    text: &'a str,
}

// ============================================================================
// SlackWebhookClient
// ============================================================================

/// [`SlackNotifier`] backed by reqwest posting to an incoming-webhook URL.
pub struct SlackWebhookClient {
    client: reqwest::Client,
    webhook_url: String,
    channel: String,
}

impl SlackWebhookClient {
    /// Create a client for the given webhook URL and channel.
    pub fn new(webhook_url: String, channel: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url,
            channel,
        }
    }
}

#[async_trait]
impl SlackNotifier for SlackWebhookClient {
    /// Post the message as `{channel, text, attachments: [{color, text}]}`.
    ///
    /// The title becomes the top-level `text` and the body travels in a
    /// single attachment colored by the event status.
    #[instrument(skip(self, message), fields(title = %message.title))]
    async fn notify(&self, message: &ChatMessage) -> RelayOutcome {
        let request = SlackWebhookRequest {
            channel: &self.channel,
            text: &message.title,
            attachments: [SlackAttachment {
                color: message.color,
                text: &message.body,
            }],
        };

        let response = match self
            .client
            .post(&self.webhook_url)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return RelayOutcome::Failed {
                    reason: format!("request failed: {}", e),
                };
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!("Slack accepted the message");
            RelayOutcome::Delivered
        } else {
            RelayOutcome::Failed {
                reason: format!("Slack returned {}", status),
            }
        }
    }
}

// Security: the webhook URL embeds a token, keep it out of debug output.
impl std::fmt::Debug for SlackWebhookClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackWebhookClient")
            .field("webhook_url", &"<REDACTED>")
            .field("channel", &self.channel)
            .finish()
    }
}

#[cfg(test)]
#[path = "slack_tests.rs"]
mod tests;
