//! Built-in tool implementations for ChatRelay.
//!
//! The completion service may ask for one of these instead of answering
//! directly. Both are deterministic and side-effect free.

pub mod summarize;
pub mod translate;

use chatrelay_core::tool::ToolRegistry;

pub use summarize::SummarizeTool;
pub use translate::TranslateTool;

/// Create a registry with all built-in tools, in advertising order.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(SummarizeTool));
    registry.register(Box::new(TranslateTool));
    registry
}
