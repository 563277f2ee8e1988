//! Common test utilities for eas-relay-api integration tests
//!
//! This module provides:
//! - A recording mock implementation of [`SlackNotifier`]
//! - Helper functions for signing request bodies the way EAS does
//! - Shared payload fixtures

use async_trait::async_trait;
use eas_relay_api::{
    slack::{RelayOutcome, SlackNotifier},
    AppState, RelayConfig, ServiceConfig,
};
use eas_relay_core::{message::ChatMessage, signature::WebhookAuthenticator};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::sync::{Arc, Mutex};

pub const TEST_SECRET: &str = "integration-test-secret";

// ============================================================================
// Mock Slack Notifier
// ============================================================================

/// Mock notifier that records every message and returns a configured
/// outcome.
#[derive(Clone)]
pub struct MockSlackNotifier {
    messages: Arc<Mutex<Vec<ChatMessage>>>,
    outcome: Arc<Mutex<RelayOutcome>>,
}

#[allow(dead_code)]
impl MockSlackNotifier {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(Mutex::new(Vec::new())),
            outcome: Arc::new(Mutex::new(RelayOutcome::Delivered)),
        }
    }

    /// Make subsequent deliveries report failure.
    pub fn fail_with(&self, reason: &str) {
        *self.outcome.lock().unwrap() = RelayOutcome::Failed {
            reason: reason.to_string(),
        };
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages.lock().unwrap().clone()
    }

    pub fn message_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }
}

#[async_trait]
impl SlackNotifier for MockSlackNotifier {
    async fn notify(&self, message: &ChatMessage) -> RelayOutcome {
        self.messages.lock().unwrap().push(message.clone());
        self.outcome.lock().unwrap().clone()
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Build an [`AppState`] wired to the given mock notifier and the test
/// secret.
#[allow(dead_code)]
pub fn test_app_state(notifier: Arc<MockSlackNotifier>) -> AppState {
    let config = ServiceConfig {
        relay: RelayConfig {
            slack_webhook_url: "https://hooks.slack.example/services/T/B/x".to_string(),
            channel: "#releases".to_string(),
            webhook_secret: TEST_SECRET.to_string(),
        },
        ..ServiceConfig::default()
    };

    AppState::new(
        config,
        Arc::new(WebhookAuthenticator::new(TEST_SECRET.to_string())),
        notifier,
    )
}

/// Sign `body` with `secret` in the `sha1=<hex>` format EAS uses.
#[allow(dead_code)]
pub fn sign_body(secret: &str, body: &[u8]) -> String {
    type HmacSha1 = Hmac<Sha1>;
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    format!("sha1={}", hex::encode(mac.finalize().into_bytes()))
}

/// A representative finished-build delivery.
#[allow(dead_code)]
pub fn sample_build_body() -> Vec<u8> {
    serde_json::json!({
        "id": "7a3f9cc2",
        "appId": "app-123",
        "projectName": "my-app",
        "status": "finished",
        "platform": "ios",
        "artifacts": { "buildUrl": "https://x" },
        "metadata": { "channel": "production", "appVersion": "1.2.3" },
        "buildDetailsPageUrl": "https://expo.dev/builds/7a3f9cc2"
    })
    .to_string()
    .into_bytes()
}

/// A representative errored-submission delivery.
#[allow(dead_code)]
pub fn sample_submission_body() -> Vec<u8> {
    serde_json::json!({
        "id": "sub-42",
        "appId": "app-123",
        "projectName": "my-app",
        "status": "errored",
        "platform": "android",
        "archiveUrl": "https://archive",
        "submissionDetailsPageUrl": "https://expo.dev/submissions/sub-42",
        "submissionInfo": {
            "error": { "message": "store rejected the binary" }
        }
    })
    .to_string()
    .into_bytes()
}
