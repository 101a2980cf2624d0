//! Tool discovery meta-tools
//!
//! Three tools that operate on the registry itself: two search tools that
//! surface hidden (deferred) tools and temporarily promote the hits into
//! the model's catalog, and a fallback that invokes a discovered tool by
//! name when the model does not emit a direct call. The meta-tools are
//! always visible, never deferred.

mod call_discovered;
mod search;

pub use call_discovered::CallDiscoveredTool;
pub use search::{Bm25SearchTool, RegexSearchTool};

use coracle_core::tools::ToolRegistry;
use std::sync::Arc;

/// Register the three discovery tools against `registry`.
///
/// The tools hold weak references back to the registry, so ownership
/// stays one-directional: the registry owns the tools.
pub fn register_discovery_tools(registry: &Arc<ToolRegistry>) {
    registry.register(Arc::new(RegexSearchTool::new(registry)));
    registry.register(Arc::new(Bm25SearchTool::new(registry)));
    registry.register(Arc::new(CallDiscoveredTool::new(registry)));
}
