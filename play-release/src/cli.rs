///
/// This module implements the CLI for play-release: argument parsing, settings
/// resolution and the async entrypoint that wires credentials, the HTTP client
/// and the core release sequence together.
///
/// All release logic lives in the [`play-release-core`] crate; this module is
/// strictly CLI glue.
///
/// ## How To Use
/// - From a shell: `play-release --aab app-release.aab --track beta --notes "..."`.
/// - Programmatically or from tests: call [`run`] with a constructed [`Cli`].
///
/// [`play-release-core`]: ../../play-release-core/
use crate::load_config::resolve_settings;
use crate::upload::{PlayClient, PLAY_API_BASE};
use anyhow::Result;
use clap::Parser;
use play_release_core::release::release;
use std::path::PathBuf;

/// Upload an Android App Bundle to a Google Play track and commit the release.
///
/// Defaults: credentials `play-service-account.json`, track `alpha`,
/// bundle `app/build/outputs/bundle/release/app-release.aab`, package `app.spread`.
#[derive(Parser, Debug, Default)]
#[clap(name = "play-release", version)]
pub struct Cli {
    /// Path to service account JSON key
    #[clap(long, env = "PLAY_CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// Release track (alpha, beta, production)
    #[clap(long, env = "PLAY_TRACK")]
    pub track: Option<String>,

    /// Path to AAB file
    #[clap(long, env = "PLAY_AAB")]
    pub aab: Option<PathBuf>,

    /// Release notes (en-US); omitted from the release when empty
    #[clap(long)]
    pub notes: Option<String>,

    /// Application id to publish to
    #[clap(long, env = "PLAY_PACKAGE_NAME")]
    pub package_name: Option<String>,

    /// Optional YAML file providing any of: package_name, credentials, track, aab, notes
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Validate the edit on the server instead of committing it
    #[clap(long)]
    pub validate_only: bool,

    /// Play API root, for pointing the client at a local test server
    #[clap(long, env = "PLAY_API_BASE_URL", hide = true)]
    pub api_base_url: Option<String>,
}

/// Async CLI entrypoint for main() and integration tests.
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let settings = resolve_settings(&cli)?;

    let base_url = cli.api_base_url.as_deref().unwrap_or(PLAY_API_BASE);
    let client = PlayClient::from_service_account(&settings.credentials, base_url).await?;

    match release(&settings.release, &client).await {
        Ok(report) => {
            tracing::info!(
                edit_id = %report.edit_id,
                version_code = report.version_code,
                track = %report.track,
                committed = report.committed,
                "Release complete"
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Release failed");
            Err(anyhow::Error::new(e))
        }
    }
}
