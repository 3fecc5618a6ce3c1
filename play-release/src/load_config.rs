/// `load_config` module: loads the optional YAML release file and layers it under the CLI flags.
///
/// This is the only place where user-supplied YAML is parsed and merged into the
/// strongly-typed [`ReleaseConfig`] used by the core release sequence.
///
/// # Responsibilities
/// - Parse the release file into [`FileConfig`] (every key optional, unknown keys rejected)
/// - Resolve each setting with precedence: explicit flag or env var > file > built-in default
/// - Keep the credentials path separate from the release settings; the core never sees it
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use play_release_core::config::{ReleaseConfig, DEFAULT_CREDENTIALS_PATH};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::cli::Cli;

/// Contents of a release YAML file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub package_name: Option<String>,
    pub credentials: Option<PathBuf>,
    pub track: Option<String>,
    pub aab: Option<PathBuf>,
    pub notes: Option<String>,
}

/// Fully resolved settings for one run.
#[derive(Debug)]
pub struct Settings {
    pub credentials: PathBuf,
    pub release: ReleaseConfig,
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    // An empty file deserializes to null, which serde_yaml won't map onto a struct.
    if config_content.trim().is_empty() {
        return Ok(FileConfig::default());
    }

    match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// Merge CLI flags over the file (when `--config` was given) over the defaults.
pub fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let file = match &cli.config {
        Some(path) => load_config(path)?,
        None => FileConfig::default(),
    };
    let defaults = ReleaseConfig::default();

    let release = ReleaseConfig {
        package_name: cli
            .package_name
            .clone()
            .or(file.package_name)
            .unwrap_or(defaults.package_name),
        bundle_path: cli.aab.clone().or(file.aab).unwrap_or(defaults.bundle_path),
        track: cli.track.clone().or(file.track).unwrap_or(defaults.track),
        release_notes: cli
            .notes
            .clone()
            .or(file.notes)
            .unwrap_or(defaults.release_notes),
        validate_only: cli.validate_only,
    };
    let credentials = cli
        .credentials
        .clone()
        .or(file.credentials)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_PATH));

    info!(credentials = %credentials.display(), "Resolved settings");
    release.trace_loaded();

    Ok(Settings {
        credentials,
        release,
    })
}
