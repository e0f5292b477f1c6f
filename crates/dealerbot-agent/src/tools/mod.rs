//! Tool modules for the Dealerbot sales agent.

pub mod base;
pub mod colleagues;
pub mod inventory;
pub mod registry;

use std::sync::Arc;

use dealerbot_providers::CompletionClient;

use crate::inventory::InventoryStore;

pub use base::Tool;
pub use colleagues::{BusinessDecisionTool, TechnicalDetailsTool};
pub use inventory::SearchInventoryTool;
pub use registry::{ToolError, ToolRegistry};

/// The dealership's fixed tool set, in prompt order.
pub fn dealership_tools(
    store: Arc<InventoryStore>,
    research: Arc<dyn CompletionClient>,
    business: Arc<dyn CompletionClient>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(SearchInventoryTool::new(store)));
    registry.register(Arc::new(TechnicalDetailsTool::new(research)));
    registry.register(Arc::new(BusinessDecisionTool::new(business)));
    registry
}
