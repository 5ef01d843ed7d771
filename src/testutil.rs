//! In-memory collaborator doubles for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::assets::{AssetHost, UploadedAsset};
use crate::error::ApiError;
use crate::identity::{IdentityProvider, VerifiedToken};
use crate::payments::{CheckoutRequest, CheckoutSession, PaymentGateway};

#[derive(Default)]
pub struct MockIdentity {
    tokens: RwLock<HashMap<String, String>>,
    roles: RwLock<HashMap<String, String>>,
}

impl MockIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_token(&self, token: &str, subject: &str) {
        self.tokens.write().await.insert(token.to_string(), subject.to_string());
    }

    pub async fn set_role(&self, subject: &str, role: &str) {
        self.roles.write().await.insert(subject.to_string(), role.to_string());
    }
}

#[async_trait]
impl IdentityProvider for MockIdentity {
    async fn verify_token(&self, token: &str) -> Result<VerifiedToken, ApiError> {
        match self.tokens.read().await.get(token) {
            Some(subject) => Ok(VerifiedToken {
                subject: subject.clone(),
                session: format!("sess_{subject}"),
            }),
            None => Err(ApiError::Authentication("invalid or expired token".into())),
        }
    }

    async fn role_of(&self, subject: &str) -> Result<Option<String>, ApiError> {
        Ok(self.roles.read().await.get(subject).cloned())
    }

    async fn set_role(&self, subject: &str, role: &str) -> Result<(), ApiError> {
        MockIdentity::set_role(self, subject, role).await;
        Ok(())
    }
}

#[derive(Default)]
pub struct MockAssets {
    pub uploads: RwLock<Vec<String>>,
    pub deleted: RwLock<Vec<String>>,
    fail_next: RwLock<bool>,
}

impl MockAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_next(&self, fail: bool) {
        *self.fail_next.write().await = fail;
    }
}

#[async_trait]
impl AssetHost for MockAssets {
    async fn upload(&self, filename: &str, _bytes: Vec<u8>) -> Result<UploadedAsset, ApiError> {
        if std::mem::take(&mut *self.fail_next.write().await) {
            return Err(ApiError::Dependency("asset host down".into()));
        }
        let url = format!("https://cdn.test/{}/{filename}", Uuid::new_v4());
        self.uploads.write().await.push(url.clone());
        Ok(UploadedAsset { url })
    }

    async fn delete(&self, url: &str) -> Result<(), ApiError> {
        self.deleted.write().await.push(url.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct MockGateway {
    pub requests: RwLock<Vec<CheckoutRequest>>,
    fail_next: RwLock<bool>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_next(&self, fail: bool) {
        *self.fail_next.write().await = fail;
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, ApiError> {
        if std::mem::take(&mut *self.fail_next.write().await) {
            return Err(ApiError::Dependency("payment processor down".into()));
        }
        let session = CheckoutSession {
            id: format!("cs_test_{}", Uuid::new_v4().simple()),
            url: format!("https://pay.test/c/{}", request.purchase_id),
        };
        self.requests.write().await.push(request);
        Ok(session)
    }
}
