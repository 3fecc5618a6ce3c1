//! # contract: the Play publishing interface and its wire types
//!
//! This module defines the [`Publisher`] trait, the single seam between the
//! release sequence and the Google Play Developer API, together with the
//! plain data types that flow across it.
//!
//! ## Interface
//! - Every method maps to exactly one remote call on the Android Publisher
//!   v3 "edits" resource (insert, bundles.upload, tracks.update, commit,
//!   validate).
//! - All methods are async and return [`PublishError`], a boxed error, so
//!   implementations can surface transport and API failures uniformly.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`; enable the `test-export-mocks`
//!   feature (on by default) to get `MockPublisher` outside this crate.
//!
//! ## Wire types
//! - [`TrackUpdate`], [`TrackRelease`] and [`LocalizedText`] serialize to
//!   the camelCase JSON the tracks endpoint expects.

use std::path::Path;

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

/// Error type for Publisher calls (boxed, so transport and API errors share one shape).
pub type PublishError = Box<dyn std::error::Error + Send + Sync>;

/// An open server-side edit. Every call after `insert_edit` references it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    /// Application id the edit belongs to (e.g. `app.spread`).
    pub package_name: String,
    /// Opaque edit id assigned by the server.
    pub id: String,
    /// Server-reported expiry, seconds since the epoch, as sent by the API.
    pub expiry_time_seconds: Option<String>,
}

/// Result of uploading a bundle into an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedBundle {
    pub version_code: i64,
    pub sha1: Option<String>,
    pub sha256: Option<String>,
}

/// Rollout status of a release on a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReleaseStatus {
    Draft,
    InProgress,
    Halted,
    Completed,
}

/// A release-notes entry in one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    /// BCP-47 language tag, e.g. `en-US`.
    pub language: String,
    pub text: String,
}

/// One release on a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRelease {
    /// Version codes are strings on the wire (int64 encoded as JSON string).
    #[serde(default)]
    pub version_codes: Vec<String>,
    pub status: ReleaseStatus,
    #[serde(default)]
    pub release_notes: Vec<LocalizedText>,
}

/// Body of a tracks.update call, and the track state the server echoes back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackUpdate {
    #[serde(default)]
    pub releases: Vec<TrackRelease>,
}

/// Trait for talking to the Play publishing API.
///
/// Implemented by the HTTP client in the CLI crate and by `MockPublisher` in tests.
/// Calls are expected to be awaited one at a time, in the order the edit
/// lifecycle requires: insert, upload, update track, then commit or validate.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Open a new edit for the package.
    async fn insert_edit(&self, package_name: &str) -> Result<EditSession, PublishError>;

    /// Upload the bundle file at `bundle` into the edit as an opaque binary stream.
    async fn upload_bundle(
        &self,
        edit: &EditSession,
        bundle: &Path,
    ) -> Result<UploadedBundle, PublishError>;

    /// Replace the releases of `track` within the edit.
    async fn update_track(
        &self,
        edit: &EditSession,
        track: &str,
        update: &TrackUpdate,
    ) -> Result<TrackUpdate, PublishError>;

    /// Commit the edit, making every change in it live.
    async fn commit_edit(&self, edit: &EditSession) -> Result<EditSession, PublishError>;

    /// Ask the server to validate the edit without committing it.
    async fn validate_edit(&self, edit: &EditSession) -> Result<EditSession, PublishError>;
}
