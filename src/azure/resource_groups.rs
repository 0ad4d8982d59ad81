//! Resource groups
//!
//! Listing follows `nextLink` eagerly. Deletion is a long-running
//! operation: ARM answers `202 Accepted` with monitor URLs that are polled
//! until the group is gone.

use super::client::AzureClient;
use crate::error::{CleanError, Result};
use crate::inventory::{InventoryItem, ResourceKind};
use reqwest::header::{HeaderMap, LOCATION, RETRY_AFTER};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

const ASYNC_OPERATION_HEADER: &str = "azure-asyncoperation";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroup {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub properties: Option<ResourceGroupProperties>,
    #[serde(default)]
    pub tags: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupProperties {
    #[serde(default)]
    pub provisioning_state: String,
}

impl ResourceGroup {
    pub fn provisioning_state(&self) -> &str {
        self.properties
            .as_ref()
            .map(|p| p.provisioning_state.as_str())
            .unwrap_or("-")
    }

    pub fn to_inventory_item(&self) -> InventoryItem {
        InventoryItem::new(&self.name, ResourceKind::ResourceGroup, &self.location)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceGroupListResult {
    #[serde(default)]
    value: Vec<ResourceGroup>,
    next_link: Option<String>,
}

/// List every resource group of the subscription, draining all pages
pub async fn list_resource_groups(client: &AzureClient) -> Result<Vec<ResourceGroup>> {
    let mut groups = Vec::new();
    let mut url = client.resource_groups_url();

    loop {
        let page: ResourceGroupListResult = client.get(&url).await?;
        groups.extend(page.value);

        match page.next_link.filter(|link| !link.is_empty()) {
            Some(link) => url = Url::parse(&url)?.join(&link)?.to_string(),
            None => break,
        }
    }

    tracing::debug!("Listed {} resource groups", groups.len());
    Ok(groups)
}

/// Delete a resource group and block until the deletion completes
///
/// A group that does not exist is an `Api` error (status 404).
pub async fn delete_resource_group(client: &AzureClient, name: &str) -> Result<()> {
    let url = client.resource_group_url(name);
    let response = client.delete(&url).await?;

    if response.status() == StatusCode::ACCEPTED {
        let poller = Poller::from_response(&url, &response, client.poll_interval())?;
        poller.poll_until_done(client).await?;
    }

    tracing::info!("Resource group {} deleted", name);
    Ok(())
}

/// Delete every resource group of the subscription in listing order
///
/// Fail-fast: the first failed delete is logged and returned, and the
/// remaining groups are left untouched. Returns the number deleted.
pub async fn delete_all_resource_groups(client: &AzureClient) -> Result<usize> {
    let groups = list_resource_groups(client).await?;
    let mut deleted = 0;

    for group in &groups {
        tracing::info!(
            "Deleting Resource Group with Name: {}, and ID: {}",
            group.name,
            group.id
        );
        if let Err(e) = delete_resource_group(client, &group.name).await {
            tracing::error!("Failed to delete resource group {}: {}", group.name, e);
            return Err(e);
        }
        deleted += 1;
    }

    Ok(deleted)
}

#[derive(Debug, Deserialize)]
struct AsyncOperationStatus {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error: Option<AsyncOperationError>,
}

#[derive(Debug, Deserialize)]
struct AsyncOperationError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Monitor for an accepted ARM delete
#[derive(Debug)]
enum Poller {
    /// Poll `Azure-AsyncOperation` until the body reports a terminal status
    AsyncOperation { url: String, delay: Duration },
    /// Poll `Location` until it stops answering `202`
    Location { url: String, delay: Duration },
    /// Accepted without a monitor URL: poll the group itself until it 404s
    Untracked { url: String, delay: Duration },
}

impl Poller {
    fn from_response(request_url: &str, response: &Response, default_delay: Duration) -> Result<Self> {
        let headers = response.headers();
        let delay = retry_after(headers).unwrap_or(default_delay);
        let base = Url::parse(request_url)?;

        if let Some(link) = header_str(headers, ASYNC_OPERATION_HEADER) {
            return Ok(Poller::AsyncOperation {
                url: base.join(link)?.to_string(),
                delay,
            });
        }
        if let Some(link) = header_str(headers, LOCATION.as_str()) {
            return Ok(Poller::Location {
                url: base.join(link)?.to_string(),
                delay,
            });
        }
        Ok(Poller::Untracked {
            url: request_url.to_string(),
            delay,
        })
    }

    async fn poll_until_done(self, client: &AzureClient) -> Result<()> {
        match self {
            Poller::Untracked { url, mut delay } => loop {
                tokio::time::sleep(delay).await;
                let response = client.poll(&url).await?;
                let status = response.status();
                if status == StatusCode::NOT_FOUND {
                    return Ok(());
                }
                if status.is_success() {
                    delay = retry_after(response.headers()).unwrap_or(client.poll_interval());
                    tracing::debug!("Resource group still present, waiting");
                    continue;
                }
                return crate::http::check_status(response)
                    .await
                    .map(|_| ())
                    .map_err(|e| CleanError::Operation(format!("delete did not complete: {}", e)));
            },
            Poller::AsyncOperation { url, mut delay } => loop {
                tokio::time::sleep(delay).await;
                let response = client.poll(&url).await?;
                delay = retry_after(response.headers()).unwrap_or(client.poll_interval());
                let response = crate::http::check_status(response)
                    .await
                    .map_err(|e| CleanError::Operation(format!("polling failed: {}", e)))?;
                let status: AsyncOperationStatus = crate::http::parse_json(response).await?;
                tracing::debug!("Async operation status: {}", status.status);

                match status.status.as_str() {
                    "Succeeded" => return Ok(()),
                    "Failed" | "Canceled" => {
                        let detail = status
                            .error
                            .map(|e| format!("{}: {}", e.code, e.message))
                            .unwrap_or_else(|| "no error details".to_string());
                        return Err(CleanError::Operation(format!(
                            "{} ({})",
                            status.status, detail
                        )));
                    }
                    _ => continue,
                }
            },
            Poller::Location { url, mut delay } => loop {
                tokio::time::sleep(delay).await;
                let response = client.poll(&url).await?;
                if response.status() == StatusCode::ACCEPTED {
                    delay = retry_after(response.headers()).unwrap_or(client.poll_interval());
                    tracing::debug!("Delete still in progress");
                    continue;
                }
                return crate::http::check_status(response)
                    .await
                    .map(|_| ())
                    .map_err(|e| CleanError::Operation(format!("delete did not complete: {}", e)));
            },
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// `Retry-After` in delta-seconds form
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    header_str(headers, RETRY_AFTER.as_str())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
