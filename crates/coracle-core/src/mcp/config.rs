//! Provider configuration for MCP servers

use super::error::McpError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Transport used to reach an MCP server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Local subprocess over stdin/stdout.
    #[default]
    Stdio,
    /// Remote server over an SSE stream plus POSTed requests.
    Sse,
    /// Remote stateless server, one POST per call.
    Http,
}

/// How to launch or reach one MCP server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(rename = "type", default)]
    pub kind: TransportKind,
    /// Server URL (sse and http transports).
    #[serde(default)]
    pub url: String,
    /// Extra HTTP headers, passed through opaquely.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Command to spawn (stdio transport).
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment overrides layered over the inherited environment.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl ServerConfig {
    /// Check that the transport has what it needs.
    pub fn validate(&self) -> Result<(), McpError> {
        match self.kind {
            TransportKind::Stdio if self.command.is_empty() => Err(McpError::Config(
                "stdio transport requires a command".into(),
            )),
            TransportKind::Sse | TransportKind::Http if self.url.is_empty() => {
                Err(McpError::Config(format!(
                    "{:?} transport requires a url",
                    self.kind
                )))
            }
            _ => Ok(()),
        }
    }
}

/// The full MCP section of the agent configuration. Servers are keyed by
/// their local alias; the ordered map keeps startup deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(default)]
    pub servers: BTreeMap<String, ServerConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_from_json_config() {
        let config: McpConfig = serde_json::from_str(
            r#"{
                "servers": {
                    "files": {"command": "mcp-files", "args": ["--root", "/tmp"]},
                    "search": {"type": "sse", "url": "https://search.example/sse",
                               "headers": {"Authorization": "Bearer x"}},
                    "quotes": {"type": "http", "url": "https://quotes.example/rpc"}
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.servers.len(), 3);
        assert_eq!(config.servers["files"].kind, TransportKind::Stdio);
        assert_eq!(config.servers["search"].kind, TransportKind::Sse);
        assert_eq!(config.servers["quotes"].kind, TransportKind::Http);
        assert_eq!(config.servers["files"].args, ["--root", "/tmp"]);
    }

    #[test]
    fn validate_missing_command() {
        let config = ServerConfig::default();
        assert!(matches!(config.validate(), Err(McpError::Config(_))));
    }

    #[test]
    fn validate_missing_url() {
        let config = ServerConfig {
            kind: TransportKind::Sse,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(McpError::Config(_))));
    }

    #[test]
    fn validate_complete_configs() {
        let stdio = ServerConfig {
            command: "server".into(),
            ..Default::default()
        };
        assert!(stdio.validate().is_ok());

        let http = ServerConfig {
            kind: TransportKind::Http,
            url: "https://example.com".into(),
            ..Default::default()
        };
        assert!(http.validate().is_ok());
    }
}
