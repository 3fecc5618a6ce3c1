//! Service-account authentication for the Google Play Developer API.
//!
//! Loads a service-account JSON key, signs an RS256 JWT assertion with it and
//! exchanges the assertion for a short-lived bearer token at the key's token URI.

use std::fmt;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Lifetime requested for the assertion; Google caps it at one hour.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: String,
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("key_type", &self.key_type)
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("private_key_id", &self.private_key_id)
            .field("project_id", &self.project_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// A bearer token for API calls.
#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_in: Option<i64>,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

impl ServiceAccountKey {
    /// Read and parse a service-account key file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(credentials = %path.display(), "Loading service account key");

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                error!(error = ?e, credentials = %path.display(), "Failed to read service account key");
                return Err(anyhow::anyhow!(
                    "cannot read service account key {}: {}",
                    path.display(),
                    e
                ));
            }
        };

        let key: ServiceAccountKey = serde_json::from_str(&content).map_err(|e| {
            error!(error = ?e, credentials = %path.display(), "Failed to parse service account key");
            anyhow::anyhow!("invalid service account key JSON in {}: {}", path.display(), e)
        })?;

        if key.key_type != "service_account" {
            error!(key_type = %key.key_type, "Credential file is not a service account key");
            bail!(
                "{} is a '{}' credential, expected a 'service_account' key",
                path.display(),
                key.key_type
            );
        }

        info!(
            client_email = %key.client_email,
            project_id = ?key.project_id,
            "Service account key loaded"
        );
        Ok(key)
    }

    /// Signed JWT asserting this account's identity for `scope`, issued at `issued_at` (unix seconds).
    pub fn signed_assertion(&self, scope: &str, issued_at: i64) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        let claims = AssertionClaims {
            iss: &self.client_email,
            scope,
            aud: &self.token_uri,
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };

        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .context("service account private_key is not a valid RSA PEM key")?;
        jsonwebtoken::encode(&header, &claims, &key).context("failed to sign JWT assertion")
    }

    /// Exchange a fresh assertion for an access token.
    pub async fn fetch_access_token(
        &self,
        http: &reqwest::Client,
        scope: &str,
    ) -> Result<AccessToken> {
        let assertion = self.signed_assertion(scope, Utc::now().timestamp())?;

        info!(token_uri = %self.token_uri, scope, "Requesting access token");
        let resp = http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .with_context(|| format!("token request to {} failed", self.token_uri))?;

        let status = resp.status();
        if !status.is_success() {
            let body: serde_json::Value = resp.json().await.unwrap_or(serde_json::Value::Null);
            let msg = body["error_description"]
                .as_str()
                .or_else(|| body["error"].as_str())
                .unwrap_or("unknown error");
            error!(status = %status, detail = msg, "Token exchange rejected");
            bail!("token exchange failed ({}): {}", status.as_u16(), msg);
        }

        let body: TokenResponse = resp
            .json()
            .await
            .context("token response was not valid JSON")?;
        let token = body
            .access_token
            .filter(|t| !t.is_empty())
            .context("token response missing access_token")?;

        info!(expires_in = ?body.expires_in, "Access token obtained");
        Ok(AccessToken {
            token,
            expires_in: body.expires_in,
        })
    }
}
