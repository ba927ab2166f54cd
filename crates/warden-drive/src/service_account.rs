//! Service-account credentials and bearer token minting.

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use warden_core::{current_unix_timestamp, PermissionServiceError};

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DRIVE_SCOPES: &str =
    "https://www.googleapis.com/auth/documents https://www.googleapis.com/auth/drive";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECONDS: u64 = 3_600;

#[derive(Clone, Deserialize)]
/// The subset of a service-account JSON key the client needs.
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[async_trait]
/// Supplies the bearer token attached to every Drive request.
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, PermissionServiceError>;
}

/// Fixed token, for callers that obtain credentials elsewhere.
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl AccessTokenSource for StaticTokenSource {
    async fn access_token(&self) -> Result<String, PermissionServiceError> {
        Ok(self.token.clone())
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Mints a fresh access token per call with the OAuth JWT-bearer grant.
pub struct ServiceAccountTokenSource {
    key: ServiceAccountKey,
    token_uri: String,
    http: reqwest::Client,
}

impl ServiceAccountTokenSource {
    /// `token_uri_override` takes precedence over the key's own `token_uri`.
    pub fn new(
        key: ServiceAccountKey,
        token_uri_override: Option<String>,
        http: reqwest::Client,
    ) -> Self {
        let token_uri = token_uri_override
            .or_else(|| key.token_uri.clone())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());
        Self {
            key,
            token_uri,
            http,
        }
    }

    fn signed_assertion(&self, now: u64) -> Result<String, PermissionServiceError> {
        let encoding_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|error| {
                PermissionServiceError::ServiceUnavailable(format!(
                    "service account private key is unusable: {error}"
                ))
            })?;
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: DRIVE_SCOPES,
            aud: &self.token_uri,
            iat: now,
            exp: now.saturating_add(ASSERTION_LIFETIME_SECONDS),
        };
        encode(&Header::new(Algorithm::RS256), &claims, &encoding_key).map_err(|error| {
            PermissionServiceError::ServiceUnavailable(format!(
                "failed to sign service account assertion: {error}"
            ))
        })
    }
}

#[async_trait]
impl AccessTokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> Result<String, PermissionServiceError> {
        let assertion = self.signed_assertion(current_unix_timestamp())?;
        let response = self
            .http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|error| {
                PermissionServiceError::ServiceUnavailable(format!(
                    "token endpoint unreachable: {error}"
                ))
            })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PermissionServiceError::ServiceUnavailable(format!(
                "token endpoint returned HTTP {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }
        let token: TokenResponse = response.json().await.map_err(|error| {
            PermissionServiceError::ServiceUnavailable(format!(
                "token endpoint returned an unreadable body: {error}"
            ))
        })?;
        tracing::debug!(client_email = %self.key.client_email, "minted drive access token");
        Ok(token.access_token)
    }
}
