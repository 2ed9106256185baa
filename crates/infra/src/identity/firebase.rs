//! Firebase Identity Toolkit REST client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use agriconnect_core::UserId;

use super::{IdentityError, IdentityProvider};

pub const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

#[derive(Debug, Clone)]
pub struct FirebaseIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl FirebaseIdentityProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self, IdentityError> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| IdentityError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    async fn call(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<reqwest::Response, IdentityError> {
        let url = format!("{}/accounts:{}", self.base_url, endpoint);
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let code = match response.json::<ErrorEnvelope>().await {
            Ok(envelope) => error_code(&envelope.error.message).to_string(),
            Err(_) => format!("HTTP {status}"),
        };
        debug!(endpoint, %status, code = %code, "identity provider rejected request");
        Err(IdentityError::Rejected(code))
    }
}

/// Firebase messages look like `WEAK_PASSWORD : Password should be ...`.
fn error_code(message: &str) -> &str {
    message.split(" : ").next().unwrap_or(message).trim()
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserId, IdentityError> {
        let body = json!({ "email": email, "password": password, "returnSecureToken": true });
        let response = match self.call("signInWithPassword", body).await {
            Ok(response) => response,
            Err(IdentityError::Rejected(_)) => return Err(IdentityError::InvalidCredentials),
            Err(e) => return Err(e),
        };
        let account: AccountResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;
        Ok(UserId::new(account.local_id))
    }

    async fn register(&self, email: &str, password: &str) -> Result<UserId, IdentityError> {
        let body = json!({ "email": email, "password": password, "returnSecureToken": true });
        let response = match self.call("signUp", body).await {
            Ok(response) => response,
            Err(IdentityError::Rejected(code)) if code == "EMAIL_EXISTS" => {
                return Err(IdentityError::EmailExists);
            }
            Err(e) => return Err(e),
        };
        let account: AccountResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;
        Ok(UserId::new(account.local_id))
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        let body = json!({ "requestType": "PASSWORD_RESET", "email": email });
        self.call("sendOobCode", body).await.map(|_| ()).inspect_err(|e| {
            warn!(error = %e, "password reset email not sent");
        })
    }
}
