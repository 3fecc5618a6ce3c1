#![doc = "Publisher integration for the CLI: implements the core `Publisher` trait against the Google Play Developer API over HTTPS."]
//
//! # Play API client
//!
//! This module bridges the release sequence in [`play_release_core::release`] to the
//! Android Publisher v3 REST API. It provides [`PlayClient`], the networked
//! [`Publisher`] used by the CLI.
//!
//! - Construct with [`PlayClient::from_service_account`] for real runs, or
//!   [`PlayClient::with_base_url`] to point at a local test server.
//! - Every call is a single request; there is no retry.
//! - Non-success responses become an [`ApiError`] carrying the server's message,
//!   so the operator sees exactly what Play rejected.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

pub use play_release_core::contract::{
    EditSession, PublishError, Publisher, TrackUpdate, UploadedBundle,
};
use play_release_core::config::ANDROID_PUBLISHER_SCOPE;

use crate::auth::ServiceAccountKey;

pub const PLAY_API_BASE: &str = "https://androidpublisher.googleapis.com";

/// A non-success response from the Play API.
#[derive(Debug)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Play API error ({}): {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppEdit {
    id: String,
    #[serde(default)]
    expiry_time_seconds: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Bundle {
    #[serde(rename = "versionCode")]
    version_code: i64,
    #[serde(default)]
    sha1: Option<String>,
    #[serde(default)]
    sha256: Option<String>,
}

pub struct PlayClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl PlayClient {
    pub fn with_base_url(access_token: String, base_url: String) -> Self {
        PlayClient {
            http: reqwest::Client::new(),
            base_url,
            access_token,
        }
    }

    /// Load the key file, obtain a token scoped for publishing and build a client for `base_url`.
    pub async fn from_service_account<P: AsRef<Path>>(
        path: P,
        base_url: &str,
    ) -> anyhow::Result<Self> {
        let key = ServiceAccountKey::from_file(path)?;
        let http = reqwest::Client::new();
        let token = key
            .fetch_access_token(&http, ANDROID_PUBLISHER_SCOPE)
            .await?;
        tracing::info!(
            client_email = %key.client_email,
            "Initialized PlayClient from service account"
        );
        Ok(PlayClient::with_base_url(token.token, base_url.to_string()))
    }

    /// Build `{base}/{segments...}`, percent-encoding each segment.
    fn url(&self, segments: &[&str]) -> Result<reqwest::Url, PublishError> {
        let mut url = reqwest::Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| format!("base URL cannot carry a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn edit_url(&self, edit: &EditSession, rest: &[&str]) -> Result<reqwest::Url, PublishError> {
        let mut segments = vec![
            "androidpublisher",
            "v3",
            "applications",
            edit.package_name.as_str(),
            "edits",
        ];
        segments.extend_from_slice(rest);
        self.url(&segments)
    }

    async fn send<T>(&self, request: reqwest::RequestBuilder) -> Result<T, PublishError>
    where
        T: serde::de::DeserializeOwned,
    {
        let resp = request.bearer_auth(&self.access_token).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|body| body["error"]["message"].as_str().map(str::to_string))
                .unwrap_or(text);
            return Err(Box::new(ApiError {
                status: status.as_u16(),
                message,
            }));
        }
        Ok(resp.json::<T>().await?)
    }

    /// Bodiless POST; Google's front end answers 411 unless the zero length is explicit.
    fn empty_post(&self, url: reqwest::Url) -> reqwest::RequestBuilder {
        self.http
            .post(url)
            .header(reqwest::header::CONTENT_LENGTH, "0")
    }

    fn to_session(package_name: &str, edit: AppEdit) -> EditSession {
        EditSession {
            package_name: package_name.to_string(),
            id: edit.id,
            expiry_time_seconds: edit.expiry_time_seconds,
        }
    }
}

/// Size and hex SHA-256 of a file, read in fixed-size chunks.
async fn sha256_file(path: &Path) -> std::io::Result<(u64, String)> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    let mut size = 0u64;
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        size += n as u64;
    }
    Ok((size, format!("{:x}", hasher.finalize())))
}

#[async_trait]
impl Publisher for PlayClient {
    async fn insert_edit(&self, package_name: &str) -> Result<EditSession, PublishError> {
        tracing::info!(package_name, "Creating edit");
        let url = self.url(&["androidpublisher", "v3", "applications", package_name, "edits"])?;
        let result: Result<AppEdit, _> = self
            .send(self.http.post(url).json(&serde_json::json!({})))
            .await;

        match result {
            Ok(edit) => {
                tracing::info!(edit_id = %edit.id, "Successfully created edit");
                Ok(Self::to_session(package_name, edit))
            }
            Err(e) => {
                tracing::error!(error = %e, package_name, "API error creating edit");
                Err(e)
            }
        }
    }

    async fn upload_bundle(
        &self,
        edit: &EditSession,
        bundle: &Path,
    ) -> Result<UploadedBundle, PublishError> {
        let (size, local_sha256) = sha256_file(bundle).await.map_err(|e| {
            tracing::error!(error = ?e, bundle = %bundle.display(), "Failed to read bundle");
            format!("cannot read bundle {}: {}", bundle.display(), e)
        })?;

        tracing::info!(
            edit_id = %edit.id,
            bundle = %bundle.display(),
            size,
            sha256 = %local_sha256,
            "Uploading bundle"
        );

        let mut url = self.url(&[
            "upload",
            "androidpublisher",
            "v3",
            "applications",
            edit.package_name.as_str(),
            "edits",
            edit.id.as_str(),
            "bundles",
        ])?;
        url.query_pairs_mut().append_pair("uploadType", "media");

        let file = tokio::fs::File::open(bundle)
            .await
            .map_err(|e| format!("cannot open bundle {}: {}", bundle.display(), e))?;
        let request = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .header(reqwest::header::CONTENT_LENGTH, size)
            .body(reqwest::Body::from(file));
        let uploaded: Bundle = match self.send(request).await {
            Ok(b) => b,
            Err(e) => {
                tracing::error!(error = %e, edit_id = %edit.id, "API error uploading bundle");
                return Err(e);
            }
        };

        match uploaded.sha256.as_deref() {
            Some(remote) if !remote.eq_ignore_ascii_case(&local_sha256) => {
                tracing::warn!(
                    local = %local_sha256,
                    remote,
                    "Server-reported bundle digest differs from local file"
                );
            }
            _ => {}
        }

        tracing::info!(
            version_code = uploaded.version_code,
            "Successfully uploaded bundle"
        );
        Ok(UploadedBundle {
            version_code: uploaded.version_code,
            sha1: uploaded.sha1,
            sha256: uploaded.sha256,
        })
    }

    async fn update_track(
        &self,
        edit: &EditSession,
        track: &str,
        update: &TrackUpdate,
    ) -> Result<TrackUpdate, PublishError> {
        tracing::info!(edit_id = %edit.id, track, releases = update.releases.len(), "Updating track");
        let url = self.edit_url(edit, &[edit.id.as_str(), "tracks", track])?;
        let result = self.send(self.http.put(url).json(update)).await;
        if let Err(e) = &result {
            tracing::error!(error = %e, edit_id = %edit.id, track, "API error updating track");
        }
        result
    }

    async fn commit_edit(&self, edit: &EditSession) -> Result<EditSession, PublishError> {
        tracing::info!(edit_id = %edit.id, "Committing edit");
        let action = format!("{}:commit", edit.id);
        let url = self.edit_url(edit, &[action.as_str()])?;
        match self.send::<AppEdit>(self.empty_post(url)).await {
            Ok(committed) => {
                tracing::info!(edit_id = %committed.id, "Successfully committed edit");
                Ok(Self::to_session(&edit.package_name, committed))
            }
            Err(e) => {
                tracing::error!(error = %e, edit_id = %edit.id, "API error committing edit");
                Err(e)
            }
        }
    }

    async fn validate_edit(&self, edit: &EditSession) -> Result<EditSession, PublishError> {
        tracing::info!(edit_id = %edit.id, "Validating edit");
        let action = format!("{}:validate", edit.id);
        let url = self.edit_url(edit, &[action.as_str()])?;
        match self.send::<AppEdit>(self.empty_post(url)).await {
            Ok(validated) => Ok(Self::to_session(&edit.package_name, validated)),
            Err(e) => {
                tracing::error!(error = %e, edit_id = %edit.id, "API error validating edit");
                Err(e)
            }
        }
    }
}
