use std::path::PathBuf;
use tracing::{debug, info};

/// Application id releases are published to unless overridden.
pub const DEFAULT_PACKAGE_NAME: &str = "app.spread";
/// Where the Android release build drops its bundle.
pub const DEFAULT_BUNDLE_PATH: &str = "app/build/outputs/bundle/release/app-release.aab";
pub const DEFAULT_TRACK: &str = "alpha";
pub const DEFAULT_CREDENTIALS_PATH: &str = "play-service-account.json";
/// OAuth scope required by every Android Publisher call.
pub const ANDROID_PUBLISHER_SCOPE: &str = "https://www.googleapis.com/auth/androidpublisher";
/// Release notes are always published in this single locale.
pub const RELEASE_NOTES_LANGUAGE: &str = "en-US";

/// Everything the release sequence needs to know about one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseConfig {
    pub package_name: String,
    pub bundle_path: PathBuf,
    pub track: String,
    /// Empty means "publish without release notes".
    pub release_notes: String,
    /// Validate the edit instead of committing it.
    pub validate_only: bool,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            package_name: DEFAULT_PACKAGE_NAME.to_string(),
            bundle_path: PathBuf::from(DEFAULT_BUNDLE_PATH),
            track: DEFAULT_TRACK.to_string(),
            release_notes: String::new(),
            validate_only: false,
        }
    }
}

impl ReleaseConfig {
    pub fn trace_loaded(&self) {
        info!(
            package_name = %self.package_name,
            bundle = %self.bundle_path.display(),
            track = %self.track,
            has_notes = !self.release_notes.is_empty(),
            validate_only = self.validate_only,
            "Loaded ReleaseConfig"
        );
        debug!(?self, "ReleaseConfig loaded (full debug)");
    }
}
