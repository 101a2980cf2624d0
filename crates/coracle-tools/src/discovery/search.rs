//! Search tools over the registry's hidden catalog

use async_trait::async_trait;
use coracle_core::tools::{
    PROMOTED_TOOL_TTL, Tool, ToolArgs, ToolRegistry, ToolResult, ToolSummary,
};
use serde_json::{Value, json};
use std::sync::{Arc, Weak};

/// Format hits and tell the model the tools are now directly callable.
fn format_unlocked(results: &[ToolSummary]) -> String {
    let schemas = serde_json::to_string_pretty(results).unwrap_or_default();
    format!(
        "Found {} tools:\n{}\n\nSUCCESS: These tools have been temporarily UNLOCKED as native tools! \
         In your next response, you can call them directly just like any normal tool, \
         without needing 'call_discovered_tool'.",
        results.len(),
        schemas,
    )
}

fn registry_gone() -> ToolResult {
    ToolResult::error("tool registry is no longer available")
}

/// Deterministic regex search over the catalog.
pub struct RegexSearchTool {
    registry: Weak<ToolRegistry>,
}

impl RegexSearchTool {
    pub fn new(registry: &Arc<ToolRegistry>) -> Self {
        Self {
            registry: Arc::downgrade(registry),
        }
    }
}

#[async_trait]
impl Tool for RegexSearchTool {
    fn name(&self) -> &str {
        "tool_search_tool_regex"
    }

    fn description(&self) -> &str {
        "Search available tools on-demand using a regex pattern. Returns JSON schemas of discovered tools."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Regex pattern to match tool name or description",
                },
            },
            "required": ["pattern"],
        })
    }

    async fn execute(&self, args: &ToolArgs) -> ToolResult {
        let Some(registry) = self.registry.upgrade() else {
            return registry_gone();
        };
        let pattern = args.get_str("pattern").unwrap_or_default();

        let results = match registry.search_regex(pattern) {
            Ok(results) => results,
            Err(e) => return ToolResult::error(e.to_string()),
        };
        if results.is_empty() {
            return ToolResult::silent("No tools found matching the pattern.");
        }

        // Unlock the hits for the next iterations.
        for hit in &results {
            registry.promote_tool(&hit.name, PROMOTED_TOOL_TTL);
        }

        ToolResult::silent(format_unlocked(&results))
    }
}

/// Natural-language search over the catalog, BM25-ranked.
pub struct Bm25SearchTool {
    registry: Weak<ToolRegistry>,
}

impl Bm25SearchTool {
    pub fn new(registry: &Arc<ToolRegistry>) -> Self {
        Self {
            registry: Arc::downgrade(registry),
        }
    }
}

#[async_trait]
impl Tool for Bm25SearchTool {
    fn name(&self) -> &str {
        "tool_search_tool_bm25"
    }

    fn description(&self) -> &str {
        "CRITICAL TOOL: You have a massive catalog of hidden tools. If you lack a specific tool \
         to fulfill the user's request, you MUST use this tool to search the catalog using natural \
         language (e.g. query='github repos', 'weather forecast', 'database'). It unlocks the tools \
         so you can use them normally."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query",
                },
            },
            "required": ["query"],
        })
    }

    async fn execute(&self, args: &ToolArgs) -> ToolResult {
        let Some(registry) = self.registry.upgrade() else {
            return registry_gone();
        };
        let query = args.get_str("query").unwrap_or_default();

        let results = registry.search_bm25(query);
        if results.is_empty() {
            return ToolResult::silent("No tools found matching the query.");
        }

        for hit in &results {
            registry.promote_tool(&hit.name, PROMOTED_TOOL_TTL);
        }

        ToolResult::silent(format_unlocked(&results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlock_message_contains_schemas_and_instruction() {
        let results = vec![ToolSummary {
            name: "alias_echo".into(),
            description: "echoes".into(),
            parameters: json!({"type": "object"}),
        }];

        let msg = format_unlocked(&results);
        assert!(msg.starts_with("Found 1 tools:"));
        assert!(msg.contains("alias_echo"));
        assert!(msg.contains("UNLOCKED"));
    }
}
