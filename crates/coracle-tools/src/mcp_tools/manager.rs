//! MCP provider lifecycle: start, handshake, register, shut down

use super::adapter::McpToolAdapter;
use coracle_core::mcp::{
    HttpClient, McpClient, McpConfig, McpError, ServerConfig, SseClient, StdioClient,
    TransportKind,
};
use coracle_core::tools::ToolRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Orchestrates configured MCP providers: builds the right client for
/// each, runs the handshake, enumerates tools, and registers one deferred
/// adapter per tool under the provider-prefixed name.
pub struct McpManager {
    registry: Arc<ToolRegistry>,
    clients: Mutex<HashMap<String, Arc<dyn McpClient>>>,
}

impl McpManager {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Start one provider and register its tools. All-or-nothing: any
    /// failure after the client exists closes it, and nothing is
    /// registered. Returns the number of tools registered.
    pub async fn start_and_register(
        &self,
        name: &str,
        config: &ServerConfig,
    ) -> Result<usize, McpError> {
        // The lock spans the whole start so two concurrent starts cannot
        // race on the same alias.
        let mut clients = self.clients.lock().await;
        if clients.contains_key(name) {
            return Err(McpError::Config(format!(
                "mcp server {name} is already running"
            )));
        }

        config.validate()?;

        let client: Arc<dyn McpClient> = match config.kind {
            TransportKind::Sse => {
                info!(server = name, url = %config.url, "connecting to mcp server via sse");
                Arc::new(SseClient::connect(&config.url, &config.headers).await?)
            }
            TransportKind::Http => {
                info!(server = name, url = %config.url, "connecting to mcp server via stateless http");
                Arc::new(HttpClient::new(&config.url, &config.headers)?)
            }
            TransportKind::Stdio => {
                info!(server = name, command = %config.command, "starting local mcp server");
                Arc::new(StdioClient::spawn(&config.command, &config.args, &config.env).await?)
            }
        };

        if let Err(e) = client.initialize().await {
            client.close().await;
            return Err(e);
        }

        let tools = match client.list_tools().await {
            Ok(tools) => tools,
            Err(e) => {
                client.close().await;
                return Err(e);
            }
        };

        let mut count = 0;
        for mut definition in tools.tools {
            let original_name = definition.name.clone();
            // Prefix with the provider alias so two providers exporting
            // the same tool name never collide.
            definition.name = format!("{name}_{original_name}");

            info!(
                server = name,
                tool = %definition.name,
                remote = %original_name,
                "registered mcp tool"
            );
            self.registry.register(Arc::new(McpToolAdapter::new(
                Arc::clone(&client),
                definition,
                original_name,
            )));
            count += 1;
        }

        clients.insert(name.to_string(), client);
        Ok(count)
    }

    /// Start every configured provider, best-effort: an individual
    /// failure is logged and does not abort the remaining starts.
    pub async fn init_from_config(&self, config: &McpConfig) {
        for (name, server_config) in &config.servers {
            match self.start_and_register(name, server_config).await {
                Ok(count) => info!(server = %name, tools = count, "initialized mcp server"),
                Err(e) => error!(server = %name, "failed to start mcp server: {e}"),
            }
        }
    }

    /// Number of live providers.
    pub async fn client_count(&self) -> usize {
        self.clients.lock().await.len()
    }

    /// Close every live client and clear the map. Registered adapters
    /// remain in the registry; their calls fail once the client is gone.
    pub async fn shutdown(&self) {
        let mut clients = self.clients.lock().await;
        for (name, client) in clients.drain() {
            info!(server = %name, "shutting down mcp server");
            client.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_command_fails_without_registration() {
        let registry = Arc::new(ToolRegistry::new());
        let manager = McpManager::new(Arc::clone(&registry));

        let config = ServerConfig {
            command: "/nonexistent/mcp-server".into(),
            ..Default::default()
        };

        assert!(manager.start_and_register("broken", &config).await.is_err());
        assert_eq!(registry.len(), 0);
        assert_eq!(manager.client_count().await, 0);
    }

    #[tokio::test]
    async fn invalid_config_is_config_error() {
        let registry = Arc::new(ToolRegistry::new());
        let manager = McpManager::new(registry);

        let config = ServerConfig::default();
        assert!(matches!(
            manager.start_and_register("empty", &config).await,
            Err(McpError::Config(_))
        ));
    }

    #[tokio::test]
    async fn best_effort_init_continues_past_failures() {
        let registry = Arc::new(ToolRegistry::new());
        let manager = McpManager::new(registry);

        let mut config = McpConfig::default();
        config.servers.insert(
            "broken".into(),
            ServerConfig {
                command: "/nonexistent/mcp-server".into(),
                ..Default::default()
            },
        );

        // Must not panic or abort.
        manager.init_from_config(&config).await;
        assert_eq!(manager.client_count().await, 0);
    }
}
