//! GCP Authentication
//!
//! Handles authentication using Application Default Credentials (ADC),
//! service account keys, or gcloud CLI credentials.

use crate::error::{optional_env, CleanError, Result};
use gcp_auth::TokenProvider;
use std::sync::Arc;

/// Default scopes for GCP API access
pub const DEFAULT_SCOPES: &[&str] = &["https://www.googleapis.com/auth/cloud-platform"];

/// Pre-issued access token, bypassing ADC discovery
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

#[derive(Clone)]
enum TokenSource {
    Adc(Arc<dyn TokenProvider>),
    Static(String),
}

/// GCP credentials holder
///
/// `gcp_auth` refreshes expired ADC tokens itself, so tokens are requested
/// on every call.
#[derive(Clone)]
pub struct GcpCredentials {
    source: TokenSource,
}

impl GcpCredentials {
    /// Create new GCP credentials using Application Default Credentials
    pub async fn new() -> Result<Self> {
        if let Some(token) = optional_env(ACCESS_TOKEN_ENV) {
            tracing::debug!("Using access token from {}", ACCESS_TOKEN_ENV);
            return Ok(Self::from_token(token));
        }

        let provider = gcp_auth::provider().await.map_err(|e| {
            CleanError::Auth(format!(
                "failed to initialize GCP authentication ({}). Run 'gcloud auth application-default login'",
                e
            ))
        })?;

        Ok(Self {
            source: TokenSource::Adc(provider),
        })
    }

    /// Credentials backed by a fixed access token
    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            source: TokenSource::Static(token.into()),
        }
    }

    /// Get an access token for API calls
    pub async fn get_token(&self) -> Result<String> {
        match &self.source {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::Adc(provider) => {
                let token = provider
                    .token(DEFAULT_SCOPES)
                    .await
                    .map_err(|e| CleanError::Auth(format!("failed to get access token: {}", e)))?;
                Ok(token.as_str().to_string())
            }
        }
    }
}
