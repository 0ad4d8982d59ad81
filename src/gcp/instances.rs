//! Compute Engine instances
//!
//! Aggregated listing across zones, deletion, and waiting on the zonal
//! operation a delete returns.

use super::client::GcpClient;
use crate::error::{CleanError, Result};
use crate::inventory::{InventoryItem, ResourceKind};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::VecDeque;

/// A Compute Engine VM instance
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub name: String,
    /// Full zone URL as returned by the API
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub machine_type: String,
    #[serde(default)]
    pub status: String,
}

impl Instance {
    /// Short machine type, e.g. `e2-medium`
    pub fn machine_type_short(&self) -> &str {
        extract_short_name(&self.machine_type)
    }

    pub fn to_inventory_item(&self, zone: &str) -> InventoryItem {
        InventoryItem::new(&self.name, ResourceKind::Instance, zone)
    }
}

/// All instances of one zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneInstances {
    /// Zone short name, e.g. `us-central1-a`
    pub zone: String,
    pub instances: Vec<Instance>,
}

impl ZoneInstances {
    pub fn inventory(&self) -> impl Iterator<Item = InventoryItem> + '_ {
        self.instances
            .iter()
            .map(|instance| instance.to_inventory_item(&self.zone))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AggregatedListResponse {
    #[serde(default)]
    items: Map<String, Value>,
    next_page_token: Option<String>,
}

/// Per-scope entry of an aggregated list; scopes without instances only
/// carry a `warning`
#[derive(Debug, Default, Deserialize)]
struct InstancesScopedList {
    #[serde(default)]
    instances: Vec<Instance>,
}

/// Extract short name from a GCP resource URL or scope key
/// e.g. "zones/us-central1-a" -> "us-central1-a"
pub fn extract_short_name(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// Lazily pages through `aggregated/instances`, yielding one zone at a time
///
/// Zone groups already returned stay valid when a later page fails.
pub struct AggregatedInstances<'a> {
    client: &'a GcpClient,
    buffer: VecDeque<ZoneInstances>,
    next_page_token: Option<String>,
    exhausted: bool,
    pages_fetched: usize,
}

impl<'a> AggregatedInstances<'a> {
    pub fn new(client: &'a GcpClient) -> Self {
        Self {
            client,
            buffer: VecDeque::new(),
            next_page_token: None,
            exhausted: false,
            pages_fetched: 0,
        }
    }

    /// Next zone that has instances, or `None` once every page is consumed
    pub async fn next_zone(&mut self) -> Result<Option<ZoneInstances>> {
        loop {
            if let Some(group) = self.buffer.pop_front() {
                return Ok(Some(group));
            }
            if self.exhausted {
                return Ok(None);
            }
            self.fetch_page().await?;
        }
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    fn page_url(&self) -> String {
        let mut url = format!(
            "{}?maxResults={}",
            self.client.compute_aggregated_url("instances"),
            self.client.page_size()
        );
        if let Some(token) = &self.next_page_token {
            url.push_str("&pageToken=");
            url.push_str(&urlencoding::encode(token));
        }
        url
    }

    async fn fetch_page(&mut self) -> Result<()> {
        let url = self.page_url();
        let page: AggregatedListResponse = self.client.get(&url).await?;
        self.pages_fetched += 1;

        for (scope, value) in page.items {
            let scoped: InstancesScopedList = serde_json::from_value(value)?;
            if scoped.instances.is_empty() {
                continue;
            }
            self.buffer.push_back(ZoneInstances {
                zone: extract_short_name(&scope).to_string(),
                instances: scoped.instances,
            });
        }

        match page.next_page_token.filter(|t| !t.is_empty()) {
            Some(token) => self.next_page_token = Some(token),
            None => self.exhausted = true,
        }
        Ok(())
    }
}

/// List all instances of the project, grouped by zone
pub async fn list_instances(client: &GcpClient) -> Result<Vec<ZoneInstances>> {
    let mut pager = AggregatedInstances::new(client);
    let mut zones = Vec::new();
    while let Some(group) = pager.next_zone().await? {
        zones.push(group);
    }
    tracing::debug!(
        "Listed {} zones with instances over {} pages",
        zones.len(),
        pager.pages_fetched()
    );
    Ok(zones)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Operation {
    name: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    error: Option<OperationErrors>,
    #[serde(default)]
    http_error_message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct OperationErrors {
    #[serde(default)]
    errors: Vec<OperationErrorDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct OperationErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl Operation {
    fn is_done(&self) -> bool {
        self.status == "DONE"
    }

    /// Outcome of a finished operation
    fn into_result(self) -> Result<()> {
        let Some(error) = self.error else {
            return Ok(());
        };

        let mut details: Vec<String> = error
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.code, e.message))
            .collect();
        if details.is_empty() {
            details.push(
                self.http_error_message
                    .unwrap_or_else(|| "unknown error".to_string()),
            );
        }
        Err(CleanError::Operation(format!(
            "{}: {}",
            self.name,
            details.join("; ")
        )))
    }
}

/// Block until a zonal operation is `DONE`
///
/// `operations/{name}/wait` returns after at most two minutes even if the
/// operation is still running, so it is called in a loop.
async fn wait_for_operation(client: &GcpClient, zone: &str, mut operation: Operation) -> Result<()> {
    while !operation.is_done() {
        tracing::debug!("Waiting for operation {} ({})", operation.name, operation.status);
        let url = client.compute_zonal_url(
            zone,
            &format!("operations/{}/wait", urlencoding::encode(&operation.name)),
        );
        operation = client.post(&url).await.map_err(|e| {
            CleanError::Operation(format!("unable to wait for the operation: {}", e))
        })?;
    }
    operation.into_result()
}

/// Delete one instance and wait for the delete operation to finish
pub async fn delete_instance(client: &GcpClient, zone: &str, name: &str) -> Result<()> {
    let url = client.compute_zonal_url(zone, &format!("instances/{}", urlencoding::encode(name)));
    let operation: Operation = client.delete(&url).await?;
    wait_for_operation(client, zone, operation).await?;
    tracing::info!("Instance {} deleted", name);
    Ok(())
}

/// Delete every instance of the project in listing order
///
/// Stops at the first failed delete and returns its error; instances after
/// it are left untouched. Returns the number of deleted instances.
pub async fn delete_all_instances(client: &GcpClient) -> Result<usize> {
    let mut pager = AggregatedInstances::new(client);
    let mut deleted = 0;

    while let Some(group) = pager.next_zone().await? {
        tracing::info!("zones/{}", group.zone);
        for instance in &group.instances {
            tracing::info!(
                "- Deleting {} {}",
                instance.name,
                instance.machine_type_short()
            );
            if let Err(e) = delete_instance(client, &group.zone, &instance.name).await {
                tracing::error!("Failed to delete instance {}: {}", instance.name, e);
                return Err(e);
            }
            deleted += 1;
        }
    }

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_short_name() {
        assert_eq!(extract_short_name("zones/us-central1-a"), "us-central1-a");
        assert_eq!(
            extract_short_name(
                "https://www.googleapis.com/compute/v1/projects/p/zones/europe-west1-b/machineTypes/e2-medium"
            ),
            "e2-medium"
        );
        assert_eq!(extract_short_name("plain"), "plain");
    }

    #[test]
    fn test_aggregated_response_keeps_zone_order() {
        let body = json!({
            "items": {
                "zones/b": {"instances": [{"name": "vm3"}]},
                "zones/a": {"instances": [{"name": "vm1"}, {"name": "vm2"}]},
                "zones/c": {"warning": {"code": "NO_RESULTS_ON_PAGE"}}
            }
        });
        let page: AggregatedListResponse = serde_json::from_value(body).unwrap();
        let keys: Vec<&String> = page.items.keys().collect();
        assert_eq!(keys, ["zones/b", "zones/a", "zones/c"]);
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn test_finished_operation_without_error_succeeds() {
        let op: Operation = serde_json::from_value(json!({
            "name": "operation-1",
            "status": "DONE"
        }))
        .unwrap();
        assert!(op.is_done());
        assert!(op.into_result().is_ok());
    }

    #[test]
    fn test_finished_operation_with_error_fails() {
        let op: Operation = serde_json::from_value(json!({
            "name": "operation-2",
            "status": "DONE",
            "error": {"errors": [{"code": "RESOURCE_IN_USE", "message": "disk busy"}]}
        }))
        .unwrap();
        let err = op.into_result().unwrap_err();
        assert!(matches!(err, CleanError::Operation(ref m) if m.contains("RESOURCE_IN_USE")));
    }

    #[test]
    fn test_inventory_uses_zone_short_name() {
        let group = ZoneInstances {
            zone: "us-east1-b".to_string(),
            instances: vec![Instance {
                name: "vm-1".to_string(),
                zone: String::new(),
                machine_type: String::new(),
                status: "RUNNING".to_string(),
            }],
        };
        let items: Vec<InventoryItem> = group.inventory().collect();
        assert_eq!(items[0].location, "us-east1-b");
        assert_eq!(items[0].kind, ResourceKind::Instance);
    }
}
