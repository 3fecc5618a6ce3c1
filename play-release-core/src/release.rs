//! High-level sequence: open edit → upload bundle → assign track → commit.
//!
//! This module provides the orchestration for publishing one Android App Bundle
//! to one Play track. The sequence is strictly linear and fail-fast:
//!   - Checks the bundle exists before touching the remote service
//!   - Opens an edit for the package and keeps its id for the rest of the run
//!   - Uploads the bundle and reads back the server-assigned version code
//!   - Replaces the track's releases with a single `completed` release for that code
//!   - Commits the edit (or validates it, in validate-only mode)
//!
//! # Major Types
//! - [`ReleaseReport`]: what was published, for the CLI to print
//! - [`ReleaseError`]: which step failed, carrying the remote error detail
//!
//! # Error Handling
//! Any failed step returns immediately. There is no retry and no rollback: an
//! edit left open after a failure is never committed and expires server-side.
//!
//! # Navigation
//! - Main entrypoint: [`release`]
//! - Track body builder: [`build_track_update`]

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::config::{ReleaseConfig, RELEASE_NOTES_LANGUAGE};
use crate::contract::{
    LocalizedText, PublishError, Publisher, ReleaseStatus, TrackRelease, TrackUpdate,
};

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseReport {
    pub edit_id: String,
    pub version_code: i64,
    pub track: String,
    /// False when the edit was only validated.
    pub committed: bool,
}

#[derive(Debug)]
pub enum ReleaseError {
    BundleNotFound(PathBuf),
    Edit(PublishError),
    Upload(PublishError),
    TrackUpdate { track: String, source: PublishError },
    Commit(PublishError),
    Validate(PublishError),
}

impl fmt::Display for ReleaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseError::BundleNotFound(path) => {
                write!(f, "bundle not found at {}", path.display())
            }
            ReleaseError::Edit(e) => write!(f, "failed to create edit: {e}"),
            ReleaseError::Upload(e) => write!(f, "failed to upload bundle: {e}"),
            ReleaseError::TrackUpdate { track, source } => {
                write!(f, "failed to assign bundle to track '{track}': {source}")
            }
            ReleaseError::Commit(e) => write!(f, "failed to commit edit: {e}"),
            ReleaseError::Validate(e) => write!(f, "failed to validate edit: {e}"),
        }
    }
}

impl std::error::Error for ReleaseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReleaseError::BundleNotFound(_) => None,
            ReleaseError::Edit(e)
            | ReleaseError::Upload(e)
            | ReleaseError::Commit(e)
            | ReleaseError::Validate(e) => Some(e.as_ref()),
            ReleaseError::TrackUpdate { source, .. } => Some(source.as_ref()),
        }
    }
}

/// Body for tracks.update: exactly one completed release carrying `version_code`.
///
/// Release notes are attached in [`RELEASE_NOTES_LANGUAGE`] only when `notes` is non-empty.
pub fn build_track_update(version_code: i64, notes: &str) -> TrackUpdate {
    let release_notes = if notes.is_empty() {
        Vec::new()
    } else {
        vec![LocalizedText {
            language: RELEASE_NOTES_LANGUAGE.to_string(),
            text: notes.to_string(),
        }]
    };

    TrackUpdate {
        releases: vec![TrackRelease {
            version_codes: vec![version_code.to_string()],
            status: ReleaseStatus::Completed,
            release_notes,
        }],
    }
}

async fn ensure_bundle_exists(path: &Path) -> Result<(), ReleaseError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => {
            error!(bundle = %path.display(), "[RELEASE][ERROR] Bundle path is not a file");
            Err(ReleaseError::BundleNotFound(path.to_path_buf()))
        }
        Err(e) => {
            error!(bundle = %path.display(), error = ?e, "[RELEASE][ERROR] Bundle not found");
            Err(ReleaseError::BundleNotFound(path.to_path_buf()))
        }
    }
}

/// Run the full release sequence against `publisher`.
pub async fn release<P>(config: &ReleaseConfig, publisher: &P) -> Result<ReleaseReport, ReleaseError>
where
    P: Publisher + ?Sized,
{
    info!(
        package_name = %config.package_name,
        track = %config.track,
        "[RELEASE] Starting release"
    );

    ensure_bundle_exists(&config.bundle_path).await?;

    // --- Step 1: Open edit ---
    let edit = match publisher.insert_edit(&config.package_name).await {
        Ok(edit) => {
            info!(edit_id = %edit.id, expiry = ?edit.expiry_time_seconds, "[RELEASE] Edit created");
            edit
        }
        Err(e) => {
            error!(error = %e, "[RELEASE][ERROR] insert_edit failed");
            return Err(ReleaseError::Edit(e));
        }
    };
    println!("Created edit: {}", edit.id);

    // --- Step 2: Upload bundle ---
    println!("Uploading {}...", config.bundle_path.display());
    let bundle = match publisher.upload_bundle(&edit, &config.bundle_path).await {
        Ok(bundle) => {
            info!(
                edit_id = %edit.id,
                version_code = bundle.version_code,
                sha256 = ?bundle.sha256,
                "[RELEASE][UPLOAD] Bundle uploaded"
            );
            bundle
        }
        Err(e) => {
            error!(edit_id = %edit.id, error = %e, "[RELEASE][ERROR][UPLOAD] upload_bundle failed");
            return Err(ReleaseError::Upload(e));
        }
    };
    println!("Uploaded bundle: versionCode={}", bundle.version_code);

    // --- Step 3: Assign to track ---
    let update = build_track_update(bundle.version_code, &config.release_notes);
    match publisher.update_track(&edit, &config.track, &update).await {
        Ok(echoed) => {
            info!(
                edit_id = %edit.id,
                track = %config.track,
                releases = echoed.releases.len(),
                "[RELEASE] Track updated"
            );
        }
        Err(e) => {
            error!(edit_id = %edit.id, track = %config.track, error = %e, "[RELEASE][ERROR] update_track failed");
            return Err(ReleaseError::TrackUpdate {
                track: config.track.clone(),
                source: e,
            });
        }
    }
    println!("Assigned to track: {}", config.track);

    // --- Step 4: Commit (or validate) ---
    if config.validate_only {
        if let Err(e) = publisher.validate_edit(&edit).await {
            error!(edit_id = %edit.id, error = %e, "[RELEASE][ERROR] validate_edit failed");
            return Err(ReleaseError::Validate(e));
        }
        info!(edit_id = %edit.id, "[RELEASE] Edit validated, left uncommitted");
        println!("Validated edit {}; not committed.", edit.id);
    } else {
        if let Err(e) = publisher.commit_edit(&edit).await {
            error!(edit_id = %edit.id, error = %e, "[RELEASE][ERROR] commit_edit failed");
            return Err(ReleaseError::Commit(e));
        }
        info!(edit_id = %edit.id, "[RELEASE] Edit committed");
        println!("Committed! Release is live.");
    }

    Ok(ReleaseReport {
        edit_id: edit.id,
        version_code: bundle.version_code,
        track: config.track.clone(),
        committed: !config.validate_only,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_notes_produce_no_release_notes() {
        let update = build_track_update(42, "");
        assert_eq!(update.releases.len(), 1);
        assert_eq!(update.releases[0].version_codes, vec!["42".to_string()]);
        assert_eq!(update.releases[0].status, ReleaseStatus::Completed);
        assert!(update.releases[0].release_notes.is_empty());
    }

    #[test]
    fn notes_are_published_in_a_single_fixed_locale() {
        let update = build_track_update(42, "Faster sync");
        assert_eq!(
            update.releases[0].release_notes,
            vec![LocalizedText {
                language: "en-US".to_string(),
                text: "Faster sync".to_string(),
            }]
        );
    }

    #[test]
    fn track_update_error_names_the_track_and_keeps_the_cause() {
        let err = ReleaseError::TrackUpdate {
            track: "beta".to_string(),
            source: "Track not found".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to assign bundle to track 'beta': Track not found"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
