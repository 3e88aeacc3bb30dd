//! Bearer-token verification against the Supabase auth service

use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

const USER_PATH: &str = "auth/v1/user";

/// User record returned by `GET /auth/v1/user`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("auth service is not configured")]
    NotConfigured,

    #[error("token rejected by auth service ({0})")]
    Rejected(StatusCode),

    #[error("auth service returned {0}")]
    Unavailable(StatusCode),

    #[error("auth service request failed")]
    Transport(#[source] reqwest::Error),

    #[error("auth service reply could not be read")]
    InvalidReply(#[source] reqwest::Error),
}

#[derive(Clone)]
pub struct AuthVerifier {
    client: Client,
    user_endpoint: Option<Url>,
    anon_key: Option<SecretString>,
}

impl AuthVerifier {
    pub fn new(client: Client, supabase_url: Option<&Url>, anon_key: Option<SecretString>) -> Self {
        let user_endpoint = supabase_url.and_then(|base| match base.join(USER_PATH) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to build auth user endpoint");
                None
            }
        });

        Self {
            client,
            user_endpoint,
            anon_key,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.user_endpoint.is_some() && self.anon_key.is_some()
    }

    /// Ask the auth service who owns `token`.
    pub async fn verify_token(&self, token: &str) -> Result<AuthUser, VerifyError> {
        let (Some(endpoint), Some(anon_key)) = (&self.user_endpoint, &self.anon_key) else {
            return Err(VerifyError::NotConfigured);
        };

        let response = self
            .client
            .get(endpoint.clone())
            .header("apikey", anon_key.expose_secret())
            .bearer_auth(token)
            .send()
            .await
            .map_err(VerifyError::Transport)?;

        let status = response.status();
        if status.is_client_error() {
            return Err(VerifyError::Rejected(status));
        }
        if !status.is_success() {
            return Err(VerifyError::Unavailable(status));
        }

        response.json().await.map_err(VerifyError::InvalidReply)
    }
}
