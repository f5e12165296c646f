//! Bearer-token acquisition for the Cloud SQL Admin API.
//!
//! The service-account key arrives in the request's `source.private_key` and
//! stays in memory: it is never written to disk and no environment variable is
//! set. Every API call asks the authenticator for a fresh token.

use crate::utils::{ResourceError, Result};
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Source of bearer tokens for the backup service.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// A token valid for at least one request, without the `Bearer ` prefix.
    async fn bearer_token(&self) -> Result<String>;
}

/// Fixed token; handy for tests and for tokens minted outside the resource.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl Authenticator for StaticToken {
    async fn bearer_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// The fields of a Google service-account JSON key that token exchange needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn from_json(raw: &str) -> Result<Self> {
        let key: ServiceAccountKey = serde_json::from_str(raw)
            .map_err(|e| ResourceError::Credential(format!("invalid service account key: {}", e)))?;
        if key.client_email.is_empty() || key.private_key.is_empty() {
            return Err(ResourceError::Credential(
                "service account key is missing client_email or private_key".into(),
            ));
        }
        Ok(key)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Exchanges a signed JWT assertion for an OAuth access token.
pub struct ServiceAccountAuthenticator {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    scope: String,
    http: reqwest::Client,
}

impl ServiceAccountAuthenticator {
    pub fn new(key: ServiceAccountKey, scope: impl Into<String>, http: reqwest::Client) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| ResourceError::Credential(format!("unusable private key: {}", e)))?;
        Ok(Self {
            key,
            encoding_key,
            scope: scope.into(),
            http,
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    fn assertion(&self, now: i64) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        let claims = AssertionClaims {
            iss: self.key.client_email.clone(),
            scope: self.scope.clone(),
            aud: self.key.token_uri.clone(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        jsonwebtoken::encode(&header, &claims, &self.encoding_key)
            .map_err(|e| ResourceError::Credential(format!("failed to sign assertion: {}", e)))
    }
}

#[async_trait]
impl Authenticator for ServiceAccountAuthenticator {
    async fn bearer_token(&self) -> Result<String> {
        let assertion = self.assertion(chrono::Utc::now().timestamp())?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| ResourceError::Credential(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResourceError::Credential(format!(
                "token endpoint returned HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ResourceError::Credential(format!("malformed token response: {}", e)))?;

        debug!(
            "Obtained access token for {} (expires in {:?}s)",
            self.key.client_email, token.expires_in
        );
        Ok(token.access_token)
    }
}
