//! SearchInventory — keyword search over the dealership's vehicle table.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::base::Tool;
use crate::inventory::InventoryStore;

pub struct SearchInventoryTool {
    store: Arc<InventoryStore>,
}

impl SearchInventoryTool {
    pub fn new(store: Arc<InventoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for SearchInventoryTool {
    fn name(&self) -> &str {
        "SearchInventory"
    }

    fn description(&self) -> &str {
        "Searches the vehicle inventory for cars matching a description (e.g., 'black sedan', '2022 Toyota')."
    }

    async fn execute(&self, input: &str) -> anyhow::Result<String> {
        debug!(query = input, "searching inventory");
        Ok(self.store.search(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::InventoryTable;
    use std::path::Path;

    fn tool() -> SearchInventoryTool {
        let table = InventoryTable::from_csv_reader(
            "id,make,model,year,price,color\n1,Toyota,Camry,2022,25000,black\n".as_bytes(),
            Path::new("inline.csv"),
        )
        .unwrap();
        SearchInventoryTool::new(Arc::new(InventoryStore::with_table("inline.csv", table)))
    }

    #[tokio::test]
    async fn test_search_hit() {
        let out = tool().execute("camry").await.unwrap();
        assert!(out.starts_with("Found the following vehicles matching 'camry':"));
        assert!(out.contains("Toyota"));
    }

    #[tokio::test]
    async fn test_search_miss_is_not_an_error() {
        let out = tool().execute("black sedan").await.unwrap();
        assert!(out.starts_with("No vehicles found"));
    }
}
