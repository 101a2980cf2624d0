//! Built-in tools for the Coracle agent runtime
//!
//! Three groups:
//!
//! - [`file_ops`] -- workspace file tools (read, write, edit, append,
//!   list) that share the sandbox filesystem's path validation and
//!   atomic-write guarantees.
//! - [`discovery`] -- the meta-tools that search the registry's hidden
//!   catalog and promote hits into the model's view.
//! - [`mcp_tools`] -- the adapter that presents remote MCP tools through
//!   the local tool contract, and the manager that starts, registers,
//!   and shuts down providers.
//!
//! [`setup`] wires the built-ins into a registry per agent configuration.

pub mod discovery;
pub mod file_ops;
pub mod mcp_tools;
pub mod setup;

pub use setup::{FilesystemToolsConfig, setup_discovery_tools, setup_workspace_tools};
