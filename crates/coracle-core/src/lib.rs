//! Coracle core library
//!
//! The tool-dispatch core of the Coracle agent runtime. It holds the
//! three subsystems every agent build needs:
//!
//! - [`tools`] -- the [`Tool`](tools::Tool) contract, dual-channel
//!   [`ToolResult`](tools::ToolResult)s, and the
//!   [`ToolRegistry`](tools::ToolRegistry) with deferred discovery:
//!   large catalogs stay hidden and are surfaced on demand through regex
//!   or BM25 search, with promotions that expire after a fixed number of
//!   agent iterations.
//! - [`mcp`] -- JSON-RPC 2.0 clients for remote tool providers over
//!   subprocess stdio, SSE + POST, and stateless HTTP, multiplexing
//!   concurrent requests over a single connection.
//! - [`sandbox`] -- workspace-confined filesystem primitives: symlink-safe
//!   path validation and atomic write-and-rename.
//!
//! Tool implementations live in the `coracle-tools` crate; this crate is
//! the contract they build against.

pub mod mcp;
pub mod sandbox;
pub mod tools;
