//! Sonarr/Radarr v3 API client
//!
//! Both managers share the same API surface; the mode picks the resource
//! (`series` or `movie`) and where the item detail keeps `sizeOnDisk`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, trace};

use crate::app_mode::LibraryMode;
use crate::config::ServiceEndpoint;
use crate::models::InventoryItem;
use crate::services::http_client::{HttpSession, read_json, redact_url};

/// Inventory, size and deletion operations of a library manager.
#[async_trait]
pub trait LibraryManager: Send + Sync {
    /// Name used in logs and fatal error messages.
    fn service_name(&self) -> &str;

    /// Full item inventory. Any failure here is fatal for the run.
    async fn list_items(&self) -> Result<Vec<InventoryItem>>;

    /// On-disk size of one item in bytes.
    async fn item_size(&self, item_id: i64) -> Result<u64>;

    /// Remove an item, optionally deleting its files.
    async fn delete_item(&self, item_id: i64, delete_files: bool) -> Result<()>;
}

/// Item detail; series nest the size under `statistics`, movies keep it top-level.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetail {
    #[serde(default)]
    pub size_on_disk: Option<u64>,
    #[serde(default)]
    pub statistics: Option<ItemStatistics>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStatistics {
    #[serde(default)]
    pub size_on_disk: Option<u64>,
}

impl ItemDetail {
    /// Size for the given mode; a missing field counts as zero.
    pub fn size_for(&self, mode: LibraryMode) -> u64 {
        match mode {
            LibraryMode::Series => self
                .statistics
                .as_ref()
                .and_then(|s| s.size_on_disk)
                .unwrap_or(0),
            LibraryMode::Movies => self.size_on_disk.unwrap_or(0),
        }
    }
}

/// Sonarr or Radarr client
pub struct ServarrClient {
    client: Client,
    base_url: String,
    api_key: String,
    mode: LibraryMode,
}

impl ServarrClient {
    pub fn new(session: &HttpSession, mode: LibraryMode, endpoint: &ServiceEndpoint) -> Self {
        Self {
            client: session.client(),
            base_url: endpoint.url.clone(),
            api_key: endpoint.api_key.clone(),
            mode,
        }
    }

    pub fn mode(&self) -> LibraryMode {
        self.mode
    }

    fn resource_url(&self) -> String {
        format!("{}/api/v3/{}", self.base_url, self.mode.api_resource())
    }

    fn item_url(&self, item_id: i64) -> String {
        format!("{}/{}", self.resource_url(), item_id)
    }
}

#[async_trait]
impl LibraryManager for ServarrClient {
    fn service_name(&self) -> &str {
        self.mode.service_name()
    }

    async fn list_items(&self) -> Result<Vec<InventoryItem>> {
        let service = self.mode.service_name();
        info!(service = %service, "Fetching library inventory");

        let response = self
            .client
            .get(self.resource_url())
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .with_context(|| format!("Failed to connect to {service}"))?;

        let items: Vec<InventoryItem> = read_json(service, "inventory", response).await?;

        debug!(service = %service, count = items.len(), "Inventory returned items");
        Ok(items)
    }

    async fn item_size(&self, item_id: i64) -> Result<u64> {
        let service = self.mode.service_name();
        let response = self
            .client
            .get(self.item_url(item_id))
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {service} item {item_id}"))?;

        let detail: ItemDetail = read_json(service, "item detail", response).await?;
        Ok(detail.size_for(self.mode))
    }

    async fn delete_item(&self, item_id: i64, delete_files: bool) -> Result<()> {
        let service = self.mode.service_name();
        info!(service = %service, item_id, delete_files, "Deleting item");

        let response = self
            .client
            .delete(self.item_url(item_id))
            .header("X-Api-Key", &self.api_key)
            .query(&[("deleteFiles", delete_files.to_string())])
            .send()
            .await
            .with_context(|| format!("Failed to delete {service} item {item_id}"))?;

        trace!(
            service = %service,
            url = %redact_url(response.url()),
            status = response.status().as_u16(),
            "Delete response"
        );

        if response.status() != StatusCode::OK {
            anyhow::bail!(
                "{service} delete of item {item_id} failed with status: {}",
                response.status()
            );
        }
        Ok(())
    }
}
