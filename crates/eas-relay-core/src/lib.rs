//! # EAS Relay Core
//!
//! Domain logic for relaying Expo EAS build/submission webhooks to a chat
//! channel. This crate is deliberately free of HTTP types so the formatting
//! and authentication logic can be tested without a server.
//!
//! Three concerns live here:
//! - [`event`] — the payload shapes EAS delivers for builds and submissions
//! - [`signature`] — HMAC-SHA1 verification of the `expo-signature` header
//! - [`message`] — mapping a validated payload to a chat message

pub mod event;
pub mod message;
pub mod signature;

pub use event::{BuildPayload, SubmissionPayload};
pub use message::{ChatMessage, MessageColor};
pub use signature::{SignatureError, WebhookAuthenticator};
