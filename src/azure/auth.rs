//! Azure Authentication
//!
//! A small default credential chain: a pre-issued token, a service
//! principal secret from the environment, or the Azure CLI login.

use crate::error::{optional_env, CleanError, Result};
use crate::http::RestClient;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::sync::RwLock;

/// Scope for Azure Resource Manager
pub const MANAGEMENT_SCOPE: &str = "https://management.azure.com/.default";

/// Resource passed to `az account get-access-token`
const MANAGEMENT_RESOURCE: &str = "https://management.azure.com/";

pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

pub const ACCESS_TOKEN_ENV: &str = "AZURE_ACCESS_TOKEN";
pub const TENANT_ID_ENV: &str = "AZURE_TENANT_ID";
pub const CLIENT_ID_ENV: &str = "AZURE_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "AZURE_CLIENT_SECRET";
pub const AUTHORITY_HOST_ENV: &str = "AZURE_AUTHORITY_HOST";

/// Token expiry buffer - refresh tokens this much before they actually expire
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Default token TTL if we can't determine expiry (conservative: 30 minutes)
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Upper bound on any reported token lifetime
const MAX_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone)]
enum CredentialSource {
    Static(String),
    ClientSecret {
        authority_host: String,
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
    AzureCli,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    fn new(token: String, ttl: Duration) -> Self {
        Self {
            token,
            expires_at: Instant::now() + ttl.min(MAX_TOKEN_TTL).saturating_sub(TOKEN_EXPIRY_BUFFER),
        }
    }

    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Azure credential resolved from the default chain, with token caching
/// for the lifetime of one command
#[derive(Clone)]
pub struct AzureCredential {
    source: CredentialSource,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliTokenResponse {
    access_token: String,
    /// Seconds since the epoch (newer CLI versions only; `expiresOn` is a
    /// local timestamp string and is ignored)
    #[serde(default, rename = "expires_on")]
    expires_on: Option<u64>,
}

impl AzureCredential {
    /// Resolve the credential chain from the environment
    ///
    /// Order: `AZURE_ACCESS_TOKEN`, then a service principal
    /// (`AZURE_TENANT_ID`, `AZURE_CLIENT_ID`, `AZURE_CLIENT_SECRET`), then
    /// the Azure CLI.
    pub fn from_env() -> Result<Self> {
        if let Some(token) = optional_env(ACCESS_TOKEN_ENV) {
            tracing::debug!("Using access token from {}", ACCESS_TOKEN_ENV);
            return Ok(Self::from_token(token));
        }

        let tenant_id = optional_env(TENANT_ID_ENV);
        let client_id = optional_env(CLIENT_ID_ENV);
        let client_secret = optional_env(CLIENT_SECRET_ENV);

        match (tenant_id, client_id, client_secret) {
            (Some(tenant_id), Some(client_id), Some(client_secret)) => {
                tracing::debug!("Using service principal credential for client {}", client_id);
                let authority_host = optional_env(AUTHORITY_HOST_ENV)
                    .unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string());
                Ok(Self::client_secret(
                    &authority_host,
                    &tenant_id,
                    &client_id,
                    &client_secret,
                ))
            }
            (None, None, None) => {
                tracing::debug!("Using Azure CLI credential");
                Ok(Self::new(CredentialSource::AzureCli))
            }
            _ => Err(CleanError::Auth(format!(
                "incomplete service principal configuration: {}, {} and {} must all be set",
                TENANT_ID_ENV, CLIENT_ID_ENV, CLIENT_SECRET_ENV
            ))),
        }
    }

    /// Credential backed by a fixed access token
    pub fn from_token(token: impl Into<String>) -> Self {
        Self::new(CredentialSource::Static(token.into()))
    }

    /// Service principal credential using the client credentials grant
    pub fn client_secret(
        authority_host: &str,
        tenant_id: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Self {
        Self::new(CredentialSource::ClientSecret {
            authority_host: authority_host.trim_end_matches('/').to_string(),
            tenant_id: tenant_id.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        })
    }

    fn new(source: CredentialSource) -> Self {
        Self {
            source,
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Get an access token for Resource Manager calls
    pub async fn get_token(&self, http: &RestClient) -> Result<String> {
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let cached = match &self.source {
            CredentialSource::Static(token) => return Ok(token.clone()),
            CredentialSource::ClientSecret {
                authority_host,
                tenant_id,
                client_id,
                client_secret,
            } => {
                request_client_credentials_token(
                    http,
                    authority_host,
                    tenant_id,
                    client_id,
                    client_secret,
                )
                .await?
            }
            CredentialSource::AzureCli => request_cli_token().await?,
        };

        let token = cached.token.clone();
        *self.token_cache.write().await = Some(cached);
        Ok(token)
    }
}

async fn request_client_credentials_token(
    http: &RestClient,
    authority_host: &str,
    tenant_id: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<CachedToken> {
    let url = format!(
        "{}/{}/oauth2/v2.0/token",
        authority_host,
        urlencoding::encode(tenant_id)
    );
    tracing::debug!("POST {}", url);

    let request = http.inner().post(&url).form(&[
        ("grant_type", "client_credentials"),
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("scope", MANAGEMENT_SCOPE),
    ]);
    let response = http
        .send(request)
        .await
        .map_err(|e| CleanError::Auth(format!("token request failed: {}", e)))?;
    let body: OAuthTokenResponse = crate::http::parse_json(response).await?;

    let ttl = body
        .expires_in
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TOKEN_TTL);
    Ok(CachedToken::new(body.access_token, ttl))
}

async fn request_cli_token() -> Result<CachedToken> {
    let output = Command::new("az")
        .args([
            "account",
            "get-access-token",
            "--resource",
            MANAGEMENT_RESOURCE,
            "--output",
            "json",
        ])
        .output()
        .await
        .map_err(|e| CleanError::Auth(format!("failed to run Azure CLI: {}. Run 'az login'", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CleanError::Auth(format!(
            "Azure CLI could not issue a token: {}",
            crate::http::sanitize_for_log(stderr.trim())
        )));
    }

    let body: CliTokenResponse = serde_json::from_slice(&output.stdout)?;
    Ok(CachedToken::new(body.access_token, cli_token_ttl(body.expires_on)))
}

fn cli_token_ttl(expires_on: Option<u64>) -> Duration {
    let Some(expires_on) = expires_on else {
        return DEFAULT_TOKEN_TTL;
    };
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    Duration::from_secs(expires_on.saturating_sub(now))
}
