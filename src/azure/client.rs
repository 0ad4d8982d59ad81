//! Azure Resource Manager client, scoped to one subscription.

use super::auth::AzureCredential;
use crate::error::{optional_env, Result};
use crate::http::RestClient;
use reqwest::Response;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Public Resource Manager endpoint
pub const DEFAULT_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";

/// Overrides the Resource Manager endpoint
pub const MANAGEMENT_ENDPOINT_ENV: &str = "AZURE_RESOURCE_MANAGER_ENDPOINT";

/// API version for `Microsoft.Resources`
pub const RESOURCES_API_VERSION: &str = "2021-04-01";

/// Polling interval for long-running operations without `Retry-After`
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct AzureClient {
    pub credential: AzureCredential,
    pub http: RestClient,
    pub subscription_id: String,
    endpoint: String,
    poll_interval: Duration,
}

impl AzureClient {
    /// Create a client using the default credential chain
    pub fn new(subscription_id: &str) -> Result<Self> {
        let credential = AzureCredential::from_env()?;
        let endpoint = optional_env(MANAGEMENT_ENDPOINT_ENV)
            .unwrap_or_else(|| DEFAULT_MANAGEMENT_ENDPOINT.to_string());
        Self::with_credential(subscription_id, credential, &endpoint)
    }

    /// Create a client with an explicit credential and endpoint
    pub fn with_credential(
        subscription_id: &str,
        credential: AzureCredential,
        endpoint: &str,
    ) -> Result<Self> {
        Ok(Self {
            credential,
            http: RestClient::new()?,
            subscription_id: subscription_id.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    async fn token(&self) -> Result<String> {
        self.credential.get_token(&self.http).await
    }

    /// GET and deserialize, failing on non-success statuses
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let token = self.token().await?;
        self.http.get_json(url, &token).await
    }

    /// DELETE, failing on non-success statuses
    pub async fn delete(&self, url: &str) -> Result<Response> {
        let token = self.token().await?;
        self.http.delete(url, &token).await
    }

    /// GET without status handling, for polling monitor URLs where `202`
    /// and failure statuses carry meaning
    pub async fn poll(&self, url: &str) -> Result<Response> {
        let token = self.token().await?;
        tracing::debug!("GET {}", url);
        Ok(self.http.inner().get(url).bearer_auth(token).send().await?)
    }

    /// Build a subscription-scoped Resource Manager URL
    pub fn subscription_url(&self, path: &str) -> String {
        format!(
            "{}/subscriptions/{}/{}?api-version={}",
            self.endpoint,
            urlencoding::encode(&self.subscription_id),
            path,
            RESOURCES_API_VERSION
        )
    }

    pub fn resource_groups_url(&self) -> String {
        self.subscription_url("resourcegroups")
    }

    pub fn resource_group_url(&self, name: &str) -> String {
        self.subscription_url(&format!("resourcegroups/{}", urlencoding::encode(name)))
    }
}
