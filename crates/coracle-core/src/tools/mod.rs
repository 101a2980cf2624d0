//! Tool contract, results, and the registry with deferred discovery

mod bm25;
mod registry;
mod result;
mod tool;

pub use registry::{BM25_SEARCH_LIMIT, PROMOTED_TOOL_TTL, ToolRegistry, ToolSummary};
pub use result::ToolResult;
pub use tool::{Tool, ToolArgs};
