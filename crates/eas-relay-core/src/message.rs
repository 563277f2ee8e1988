//! Payload-to-message formatting.
//!
//! Maps a validated build or submission payload to the title/body pair that
//! gets posted to the chat channel. Formatting is deterministic: the same
//! payload always produces the same message, and the line order matches
//! what the team is used to reading in the channel.
//!
//! Nested sections that EAS omitted render the literal placeholder
//! `unknown` rather than failing the request; the one exception is the
//! artifact line, which renders `No artifact`.

use crate::event::{BuildPayload, SubmissionPayload};
use serde::Serialize;

/// Placeholder rendered for optional fields EAS did not send.
const UNKNOWN: &str = "unknown";

/// Slack attachment color classes.
///
/// Serialized values are the legacy Slack attachment color names, which is
/// what the incoming-webhook API expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageColor {
    Good,
    Warning,
    Danger,
}

impl MessageColor {
    /// Map a lifecycle status to an attachment color.
    ///
    /// Total over arbitrary status strings: `canceled` is a warning,
    /// `errored` is a danger, and everything else — `finished` included —
    /// reads as good. Unrecognized statuses are deliberately not errors.
    pub fn for_status(status: &str) -> Self {
        match status {
            "canceled" => MessageColor::Warning,
            "errored" => MessageColor::Danger,
            _ => MessageColor::Good,
        }
    }
}

/// A formatted chat message, ready for relay.
///
/// Never mutated after creation; discarded after the outbound post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub title: String,
    pub body: String,
    pub color: MessageColor,
}

/// Format a build lifecycle event.
///
/// Body lines, in order: build ID, app ID, platform, channel, app version,
/// then either the error message (failed builds) or the artifact link and
/// detail page (everything else). A failed build's body ends at the
/// `Error:` line; no artifact line is emitted for it.
pub fn format_build(payload: &BuildPayload) -> ChatMessage {
    let title = format!("Build {} on {}", payload.status, payload.project_name);

    let channel = payload
        .metadata
        .as_ref()
        .and_then(|m| m.channel.as_deref())
        .unwrap_or(UNKNOWN);
    let app_version = payload
        .metadata
        .as_ref()
        .and_then(|m| m.app_version.as_deref())
        .unwrap_or(UNKNOWN);

    let mut lines = vec![
        format!("Build ID: {}", payload.id),
        format!("App ID: {}", payload.app_id),
        format!("Platform: {}", payload.platform),
        format!("Channel: {}", channel),
        format!("App Version: {}", app_version),
    ];

    if let Some(error) = &payload.error {
        lines.push(format!("Error: {}", error.message));
    } else {
        let artifact = payload
            .artifacts
            .as_ref()
            .and_then(|a| a.build_url.as_deref())
            .unwrap_or("No artifact");
        lines.push(format!("Artifact: {}", artifact));
        lines.push(format!(
            "Build Detail Page: {}",
            payload.build_details_page_url.as_deref().unwrap_or(UNKNOWN)
        ));
    }

    ChatMessage {
        title,
        body: lines.join("\n"),
        color: MessageColor::for_status(&payload.status),
    }
}

/// Format a store submission lifecycle event.
///
/// Body lines, in order: submission ID, app ID, platform, archive link,
/// detail page, then the store error message for `errored` submissions or
/// the logs link for everything else.
pub fn format_submission(payload: &SubmissionPayload) -> ChatMessage {
    let title = format!("Submission {} on {}", payload.status, payload.project_name);

    let mut lines = vec![
        format!("Submission ID: {}", payload.id),
        format!("App ID: {}", payload.app_id),
        format!("Platform: {}", payload.platform),
        format!(
            "Archive: {}",
            payload.archive_url.as_deref().unwrap_or(UNKNOWN)
        ),
        format!(
            "Submission Detail Page: {}",
            payload
                .submission_details_page_url
                .as_deref()
                .unwrap_or(UNKNOWN)
        ),
    ];

    if payload.status == "errored" {
        let message = payload
            .submission_info
            .as_ref()
            .and_then(|info| info.error.as_ref())
            .map(|error| error.message.as_str())
            .unwrap_or(UNKNOWN);
        lines.push(format!("Error: {}", message));
    } else {
        let logs = payload
            .submission_info
            .as_ref()
            .and_then(|info| info.logs_url.as_deref())
            .unwrap_or(UNKNOWN);
        lines.push(format!("Logs: {}", logs));
    }

    ChatMessage {
        title,
        body: lines.join("\n"),
        color: MessageColor::for_status(&payload.status),
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
