//! GCP Client
//!
//! Main client for interacting with the Compute Engine API, combining
//! authentication and HTTP functionality.

use super::auth::GcpCredentials;
use crate::error::{optional_env, Result};
use crate::http::RestClient;
use serde::de::DeserializeOwned;

/// Public Compute Engine endpoint
pub const DEFAULT_COMPUTE_ENDPOINT: &str = "https://compute.googleapis.com";

/// Overrides the Compute Engine endpoint
pub const COMPUTE_ENDPOINT_ENV: &str = "GCP_COMPUTE_ENDPOINT";

/// Default `maxResults` for aggregated list pages (the API maximum)
pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// Main GCP client, scoped to one project
#[derive(Clone)]
pub struct GcpClient {
    pub credentials: GcpCredentials,
    pub http: RestClient,
    pub project_id: String,
    endpoint: String,
    page_size: u32,
}

impl GcpClient {
    /// Create a new GCP client using Application Default Credentials
    pub async fn new(project_id: &str) -> Result<Self> {
        let credentials = GcpCredentials::new().await?;
        let endpoint =
            optional_env(COMPUTE_ENDPOINT_ENV).unwrap_or_else(|| DEFAULT_COMPUTE_ENDPOINT.to_string());
        Self::with_credentials(project_id, credentials, &endpoint)
    }

    /// Create a client with explicit credentials and endpoint
    pub fn with_credentials(
        project_id: &str,
        credentials: GcpCredentials,
        endpoint: &str,
    ) -> Result<Self> {
        Ok(Self {
            credentials,
            http: RestClient::new()?,
            project_id: project_id.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Set the page size hint used by aggregated list calls
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Make a GET request to the Compute API
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let token = self.credentials.get_token().await?;
        self.http.get_json(url, &token).await
    }

    /// Make a bodiless POST request to the Compute API
    pub async fn post<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let token = self.credentials.get_token().await?;
        self.http.post_json(url, &token).await
    }

    /// Make a DELETE request to the Compute API
    pub async fn delete<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let token = self.credentials.get_token().await?;
        let response = self.http.delete(url, &token).await?;
        crate::http::parse_json(response).await
    }

    // =========================================================================
    // Compute Engine API helpers
    // =========================================================================

    /// Build Compute Engine API URL
    pub fn compute_url(&self, path: &str) -> String {
        format!(
            "{}/compute/v1/projects/{}/{}",
            self.endpoint,
            urlencoding::encode(&self.project_id),
            path
        )
    }

    /// Build zonal Compute Engine API URL
    pub fn compute_zonal_url(&self, zone: &str, resource: &str) -> String {
        self.compute_url(&format!("zones/{}/{}", urlencoding::encode(zone), resource))
    }

    /// Build aggregated Compute Engine API URL (all zones)
    pub fn compute_aggregated_url(&self, resource: &str) -> String {
        self.compute_url(&format!("aggregated/{}", resource))
    }
}
