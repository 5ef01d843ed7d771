use anyhow::{Context, Result};
use std::env;

/// Process configuration, read once at boot.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Origin the payment processor redirects back to after checkout.
    pub public_origin: String,
    pub currency: String,

    pub identity_api_url: String,
    pub identity_api_key: String,
    pub identity_webhook_secret: String,

    pub asset_api_url: String,
    pub asset_api_key: String,

    pub payment_api_url: String,
    pub payment_api_key: String,
    pub payment_webhook_secret: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: env::var("PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(8080),
            database_url: env::var("DATABASE_URL").context("DATABASE_URL not set")?,
            public_origin: env::var("PUBLIC_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".into()),
            currency: env::var("CURRENCY").unwrap_or_else(|_| "usd".into()),

            identity_api_url: env::var("IDENTITY_API_URL")
                .unwrap_or_else(|_| "https://api.identity.example.com".into()),
            identity_api_key: env::var("IDENTITY_API_KEY").context("IDENTITY_API_KEY not set")?,
            identity_webhook_secret: env::var("IDENTITY_WEBHOOK_SECRET")
                .context("IDENTITY_WEBHOOK_SECRET not set")?,

            asset_api_url: env::var("ASSET_API_URL")
                .unwrap_or_else(|_| "https://api.assets.example.com".into()),
            asset_api_key: env::var("ASSET_API_KEY").context("ASSET_API_KEY not set")?,

            payment_api_url: env::var("PAYMENT_API_URL")
                .unwrap_or_else(|_| "https://api.payments.example.com".into()),
            payment_api_key: env::var("PAYMENT_API_KEY").context("PAYMENT_API_KEY not set")?,
            payment_webhook_secret: env::var("PAYMENT_WEBHOOK_SECRET")
                .context("PAYMENT_WEBHOOK_SECRET not set")?,
        })
    }
}
