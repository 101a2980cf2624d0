//! Tool registry with deferred discovery
//!
//! The registry is the process-wide catalog of everything the agent can
//! call. Most of a large catalog stays hidden: deferred tools are absent
//! from [`visible_tools`](ToolRegistry::visible_tools) until a search
//! promotes them, and promotions expire after a fixed number of agent
//! iterations so the model-facing schema list stays small.

use super::bm25::Bm25Index;
use super::result::ToolResult;
use super::tool::{Tool, ToolArgs};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// How many agent iterations a discovered tool stays unlocked before it
/// becomes invisible again.
pub const PROMOTED_TOOL_TTL: u32 = 10;

/// Maximum number of hits returned by a BM25 search.
pub const BM25_SEARCH_LIMIT: usize = 10;

/// Search hit: the model-facing identity of one tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Default)]
struct Inner {
    /// Insertion order is load-bearing: list and search results are stable.
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
    /// Deferred tool name -> remaining promotion TTL in agent iterations.
    promotions: HashMap<String, u32>,
    bm25: Bm25Index,
}

impl Inner {
    fn rebuild_bm25(&mut self) {
        let docs: Vec<String> = self
            .tools
            .iter()
            .map(|t| format!("{} {}", t.name(), t.description()))
            .collect();
        self.bm25 = Bm25Index::build(docs.iter().map(String::as_str));
    }

    fn is_promoted(&self, name: &str) -> bool {
        self.promotions.get(name).is_some_and(|ttl| *ttl > 0)
    }

    fn summary(&self, index: usize) -> ToolSummary {
        let tool = &self.tools[index];
        ToolSummary {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            parameters: tool.parameters(),
        }
    }
}

/// Process-wide catalog of tools.
///
/// Reads (list, get, search) take a read lock and run concurrently;
/// writes (register, promote, tick) take the write lock. The lock is
/// never held across a tool execution.
#[derive(Default)]
pub struct ToolRegistry {
    inner: RwLock<Inner>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Names are unique: registering an existing name
    /// overwrites the entry in place, keeping its original insertion
    /// position so list and search order stay stable.
    pub fn register(&self, tool: Arc<dyn Tool>) {
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        let name = tool.name().to_string();
        match inner.by_name.get(&name) {
            Some(&index) => inner.tools[index] = tool,
            None => {
                let index = inner.tools.len();
                inner.tools.push(tool);
                inner.by_name.insert(name, index);
            }
        }
        inner.rebuild_bm25();
    }

    /// Look up a tool regardless of visibility. The model may call a
    /// deferred tool directly by name once it has discovered it.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        let inner = self.inner.read();
        inner.by_name.get(name).map(|&i| Arc::clone(&inner.tools[i]))
    }

    pub fn len(&self) -> usize {
        self.inner.read().tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().tools.is_empty()
    }

    /// The tools currently exposed to the model: non-deferred tools in
    /// insertion order, followed by promoted deferred tools in insertion
    /// order.
    pub fn visible_tools(&self) -> Vec<Arc<dyn Tool>> {
        let inner = self.inner.read();
        let mut visible: Vec<Arc<dyn Tool>> = inner
            .tools
            .iter()
            .filter(|t| !t.is_deferred())
            .cloned()
            .collect();
        visible.extend(
            inner
                .tools
                .iter()
                .filter(|t| t.is_deferred() && inner.is_promoted(t.name()))
                .cloned(),
        );
        visible
    }

    /// Schema projections of [`visible_tools`](Self::visible_tools), in
    /// the same order.
    pub fn visible_schemas(&self) -> Vec<Value> {
        self.visible_tools().iter().map(|t| t.schema()).collect()
    }

    /// Execute a tool by name. Unknown names produce an error result with
    /// a stable message. Executing a deferred tool renews its promotion,
    /// so a tool in active use does not vanish mid-task.
    pub async fn execute(&self, name: &str, args: &ToolArgs) -> ToolResult {
        let Some(tool) = self.get(name) else {
            return ToolResult::error(format!("unknown tool: {name}"));
        };

        if tool.is_deferred() {
            self.inner
                .write()
                .promotions
                .insert(name.to_string(), PROMOTED_TOOL_TTL);
        }

        debug!(tool = name, "executing tool");
        tool.execute(args).await
    }

    /// Scan `name + " " + description` of every tool with a compiled
    /// regex. Results keep insertion order. Invalid patterns surface as
    /// an error.
    pub fn search_regex(&self, pattern: &str) -> Result<Vec<ToolSummary>, regex::Error> {
        let re = regex::Regex::new(pattern)?;
        let inner = self.inner.read();
        Ok((0..inner.tools.len())
            .filter(|&i| {
                let tool = &inner.tools[i];
                re.is_match(&format!("{} {}", tool.name(), tool.description()))
            })
            .map(|i| inner.summary(i))
            .collect())
    }

    /// Rank every tool against the query with BM25 and return the top
    /// hits, ties broken by insertion order.
    pub fn search_bm25(&self, query: &str) -> Vec<ToolSummary> {
        let inner = self.inner.read();
        inner
            .bm25
            .search(query)
            .into_iter()
            .take(BM25_SEARCH_LIMIT)
            .map(|(doc, _)| inner.summary(doc))
            .collect()
    }

    /// Set or refresh a promotion. Unknown names are ignored.
    pub fn promote_tool(&self, name: &str, ttl: u32) {
        let mut inner = self.inner.write();
        if inner.by_name.contains_key(name) {
            inner.promotions.insert(name.to_string(), ttl);
        }
    }

    /// Decrement every promotion by one iteration and drop the expired
    /// ones. The agent driver calls this exactly once per model iteration.
    pub fn tick_promotions(&self) {
        let mut inner = self.inner.write();
        inner.promotions.retain(|_, ttl| {
            *ttl = ttl.saturating_sub(1);
            *ttl > 0
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct FakeTool {
        name: &'static str,
        description: &'static str,
        deferred: bool,
        reply: &'static str,
    }

    impl FakeTool {
        fn new(name: &'static str, description: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                description,
                deferred: false,
                reply: "ok",
            })
        }

        fn deferred(name: &'static str, description: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                description,
                deferred: true,
                reply: "ok",
            })
        }
    }

    #[async_trait]
    impl Tool for FakeTool {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            self.description
        }

        fn parameters(&self) -> Value {
            json!({"type": "object"})
        }

        async fn execute(&self, _args: &ToolArgs) -> ToolResult {
            ToolResult::text(self.reply)
        }

        fn is_deferred(&self) -> bool {
            self.deferred
        }
    }

    #[test]
    fn register_and_get() {
        let registry = ToolRegistry::new();
        registry.register(FakeTool::new("read_file", "Read a file"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("read_file").unwrap().name(), "read_file");
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn overwrite_keeps_position() {
        let registry = ToolRegistry::new();
        registry.register(FakeTool::new("a", "first"));
        registry.register(FakeTool::new("b", "second"));
        registry.register(FakeTool::new("a", "replacement"));

        assert_eq!(registry.len(), 2);
        let names: Vec<String> = registry
            .visible_tools()
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(registry.get("a").unwrap().description(), "replacement");
    }

    #[test]
    fn deferred_hidden_until_promoted() {
        let registry = ToolRegistry::new();
        registry.register(FakeTool::new("visible", "always listed"));
        registry.register(FakeTool::deferred("hidden", "listed on demand"));

        let names: Vec<String> = registry
            .visible_tools()
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(names, ["visible"]);

        registry.promote_tool("hidden", 3);
        let names: Vec<String> = registry
            .visible_tools()
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(names, ["visible", "hidden"]);
    }

    #[test]
    fn promotion_expires_after_ttl_ticks() {
        let registry = ToolRegistry::new();
        registry.register(FakeTool::deferred("d", "deferred"));
        registry.promote_tool("d", 3);

        registry.tick_promotions();
        registry.tick_promotions();
        assert_eq!(registry.visible_tools().len(), 1);

        registry.tick_promotions();
        assert!(registry.visible_tools().is_empty());
    }

    #[test]
    fn promote_unknown_name_is_ignored() {
        let registry = ToolRegistry::new();
        registry.promote_tool("ghost", 5);
        assert!(registry.visible_tools().is_empty());
    }

    #[tokio::test]
    async fn execute_unknown_tool() {
        let registry = ToolRegistry::new();
        let res = registry.execute("ghost", &ToolArgs::new()).await;
        assert!(res.is_error);
        assert_eq!(res.for_llm, "unknown tool: ghost");
    }

    #[tokio::test]
    async fn execute_renews_promotion() {
        let registry = ToolRegistry::new();
        registry.register(FakeTool::deferred("d", "deferred"));
        registry.promote_tool("d", 1);

        let res = registry.execute("d", &ToolArgs::new()).await;
        assert!(!res.is_error);

        // A single tick would have expired the original promotion.
        registry.tick_promotions();
        assert_eq!(registry.visible_tools().len(), 1);
    }

    #[tokio::test]
    async fn execute_works_regardless_of_visibility() {
        let registry = ToolRegistry::new();
        registry.register(FakeTool::deferred("d", "deferred"));

        let res = registry.execute("d", &ToolArgs::new()).await;
        assert_eq!(res.for_llm, "ok");
    }

    #[test]
    fn regex_search_keeps_insertion_order() {
        let registry = ToolRegistry::new();
        registry.register(FakeTool::new("write_file", "Write content to a file"));
        registry.register(FakeTool::new("read_file", "Read the contents of a file"));
        registry.register(FakeTool::new("stock_quote", "Fetch a stock quote"));

        let hits = registry.search_regex("file").unwrap();
        let names: Vec<&str> = hits.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["write_file", "read_file"]);
    }

    #[test]
    fn regex_search_invalid_pattern() {
        let registry = ToolRegistry::new();
        assert!(registry.search_regex("[unclosed").is_err());
    }

    #[test]
    fn bm25_search_finds_description_token() {
        let registry = ToolRegistry::new();
        registry.register(FakeTool::new("alpha", "manage kubernetes clusters"));
        registry.register(FakeTool::new("beta", "send chat messages"));

        let hits = registry.search_bm25("kubernetes");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "alpha");
    }

    #[test]
    fn bm25_search_caps_results() {
        let registry = ToolRegistry::new();
        for i in 0..20 {
            let name: &'static str = Box::leak(format!("tool_{i}").into_boxed_str());
            registry.register(FakeTool::new(name, "common description"));
        }

        let hits = registry.search_bm25("common");
        assert_eq!(hits.len(), BM25_SEARCH_LIMIT);
        // Equal scores keep insertion order.
        assert_eq!(hits[0].name, "tool_0");
    }
}
