//! Identity provider collaborator. The core trusts only the verified
//! subject id coming back from `verify_token`, never a client-supplied
//! claim.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ApiError;

pub const ROLE_EDUCATOR: &str = "educator";

#[derive(Debug, Clone, Deserialize)]
pub struct VerifiedToken {
    pub subject: String,
    pub session: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<VerifiedToken, ApiError>;
    async fn role_of(&self, subject: &str) -> Result<Option<String>, ApiError>;
    async fn set_role(&self, subject: &str, role: &str) -> Result<(), ApiError>;
}

pub struct HttpIdentityProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpIdentityProvider {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self { http: reqwest::Client::new(), base_url, api_key }
    }
}

#[derive(Deserialize)]
struct RoleResponse {
    role: Option<String>,
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn verify_token(&self, token: &str) -> Result<VerifiedToken, ApiError> {
        let res = self
            .http
            .post(format!("{}/v1/tokens/verify", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await
            .map_err(|e| ApiError::Dependency(format!("identity provider unreachable: {e}")))?;

        if res.status() == reqwest::StatusCode::UNAUTHORIZED
            || res.status() == reqwest::StatusCode::NOT_FOUND
        {
            return Err(ApiError::Authentication("invalid or expired token".into()));
        }
        if !res.status().is_success() {
            return Err(ApiError::Dependency(format!(
                "identity provider returned {}",
                res.status()
            )));
        }
        res.json()
            .await
            .map_err(|e| ApiError::Dependency(format!("bad identity response: {e}")))
    }

    async fn role_of(&self, subject: &str) -> Result<Option<String>, ApiError> {
        let res = self
            .http
            .get(format!("{}/v1/users/{subject}", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ApiError::Dependency(format!("identity provider unreachable: {e}")))?;
        if !res.status().is_success() {
            return Err(ApiError::Dependency(format!(
                "identity provider returned {}",
                res.status()
            )));
        }
        let body: RoleResponse = res
            .json()
            .await
            .map_err(|e| ApiError::Dependency(format!("bad identity response: {e}")))?;
        Ok(body.role)
    }

    async fn set_role(&self, subject: &str, role: &str) -> Result<(), ApiError> {
        let res = self
            .http
            .patch(format!("{}/v1/users/{subject}/role", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "role": role }))
            .send()
            .await
            .map_err(|e| ApiError::Dependency(format!("identity provider unreachable: {e}")))?;
        if !res.status().is_success() {
            return Err(ApiError::Dependency(format!(
                "identity provider returned {}",
                res.status()
            )));
        }
        Ok(())
    }
}
