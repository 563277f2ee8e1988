//! Payload shapes delivered by the EAS webhook service.
//!
//! EAS posts two distinct shapes, one per lifecycle: builds and store
//! submissions. The two are dispatched by route (`/build` vs `/submit`),
//! never by sniffing fields, so each shape gets its own struct.
//!
//! Field policy: the identity fields (`id`, `appId`, `projectName`,
//! `status`, `platform`) are required and a body missing them fails
//! deserialization. Everything nested is optional because EAS omits
//! sections that do not apply to the event (for example `error` on a
//! successful build, or `artifacts` on a failed one).

use serde::Deserialize;

/// Webhook payload for a build lifecycle event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPayload {
    /// Build identifier assigned by EAS.
    pub id: String,

    /// Owning application identifier.
    pub app_id: String,

    /// Human-readable project name.
    pub project_name: String,

    /// Lifecycle status. Known values are `finished`, `errored` and
    /// `canceled`, but the set is open; unknown values are not an error.
    pub status: String,

    /// Target platform (`ios` / `android`).
    pub platform: String,

    /// Build outputs; absent when the build produced none.
    #[serde(default)]
    pub artifacts: Option<BuildArtifacts>,

    /// Build metadata; absent for some event kinds.
    #[serde(default)]
    pub metadata: Option<BuildMetadata>,

    /// Present only when the build failed.
    #[serde(default)]
    pub error: Option<EventError>,

    /// Link to the build detail page on expo.dev.
    #[serde(default)]
    pub build_details_page_url: Option<String>,
}

/// Build output artifacts.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildArtifacts {
    #[serde(default)]
    pub build_url: Option<String>,
}

/// Build metadata reported alongside the event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildMetadata {
    #[serde(default)]
    pub channel: Option<String>,

    #[serde(default)]
    pub app_version: Option<String>,
}

/// Error details carried by failed builds and submissions.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventError {
    pub message: String,
}

/// Webhook payload for a store submission lifecycle event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    /// Submission identifier assigned by EAS.
    pub id: String,

    /// Owning application identifier.
    pub app_id: String,

    /// Human-readable project name.
    pub project_name: String,

    /// Lifecycle status; same open set as builds.
    pub status: String,

    /// Target platform (`ios` / `android`).
    pub platform: String,

    /// Archive that was submitted to the store.
    #[serde(default)]
    pub archive_url: Option<String>,

    /// Link to the submission detail page on expo.dev.
    #[serde(default)]
    pub submission_details_page_url: Option<String>,

    /// Store-side details; carries either logs or an error.
    #[serde(default)]
    pub submission_info: Option<SubmissionInfo>,
}

/// Store-side submission details.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionInfo {
    #[serde(default)]
    pub logs_url: Option<String>,

    #[serde(default)]
    pub error: Option<EventError>,
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
