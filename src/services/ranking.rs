//! Rank library items by on-disk size
//!
//! Sizes are fetched one request per item through the bounded fan-out. A
//! failed lookup degrades to zero bytes so a single bad item never blocks the
//! run; such items simply sink to the bottom of the ranking.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{AnalyzerError, Result};
use crate::models::{InventoryItem, LibraryItem};
use crate::services::fanout::gather_indexed;
use crate::services::servarr::LibraryManager;

/// Fetches inventory and sizes, then keeps the largest items.
pub struct SizeRanker {
    library: Arc<dyn LibraryManager>,
    max_concurrent: usize,
}

impl SizeRanker {
    pub fn new(library: Arc<dyn LibraryManager>, max_concurrent: usize) -> Self {
        Self {
            library,
            max_concurrent,
        }
    }

    /// Largest `limit` items of the whole inventory.
    ///
    /// Fails with [`AnalyzerError::UpstreamUnavailable`] if the inventory
    /// cannot be listed.
    pub async fn top_by_size(&self, limit: usize) -> Result<Vec<LibraryItem>> {
        let service = self.library.service_name().to_string();
        let inventory = self
            .library
            .list_items()
            .await
            .map_err(|e| AnalyzerError::upstream(&service, e))?;

        info!(service = %service, items = inventory.len(), "Fetching sizes for inventory");
        let sized = self.attach_sizes(inventory).await;
        let ranked = rank_by_size(sized, limit);
        debug!(service = %service, kept = ranked.len(), limit, "Ranked items by size");
        Ok(ranked)
    }

    /// Fetch every item's size concurrently. Output order matches input order.
    pub async fn attach_sizes(&self, inventory: Vec<InventoryItem>) -> Vec<LibraryItem> {
        let ids: Vec<(i64, String)> = inventory
            .iter()
            .map(|item| (item.id, item.title.clone()))
            .collect();

        let library = self.library.clone();
        let sizes = gather_indexed(ids, self.max_concurrent, move |(id, title)| {
            let library = library.clone();
            async move { fetch_size_or_zero(library.as_ref(), id, &title).await }
        })
        .await;

        inventory
            .into_iter()
            .zip(sizes)
            .map(|(item, size)| {
                let size = size.unwrap_or_else(|e| {
                    warn!(item_id = item.id, title = %item.title, error = %e, "Size lookup task failed, using 0");
                    0
                });
                LibraryItem::from_inventory(item, size)
            })
            .collect()
    }
}

/// Size of one item, or zero if the lookup fails for any reason.
pub async fn fetch_size_or_zero(library: &dyn LibraryManager, item_id: i64, title: &str) -> u64 {
    match library.item_size(item_id).await {
        Ok(size) => size,
        Err(e) => {
            warn!(
                service = %library.service_name(),
                item_id,
                title = %title,
                error = %format!("{e:#}"),
                "Failed to get item size, using 0"
            );
            0
        }
    }
}

/// Stable sort by size, largest first, then keep the first `limit`.
///
/// Items of equal size keep their inventory order.
pub fn rank_by_size(mut items: Vec<LibraryItem>, limit: usize) -> Vec<LibraryItem> {
    items.sort_by(|a, b| b.size_on_disk.cmp(&a.size_on_disk));
    items.truncate(limit);
    items
}
