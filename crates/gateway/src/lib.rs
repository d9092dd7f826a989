//! Wiring for the `n8n-mcp-gateway` binary: CLI surface and
//! config-driven startup. The actual MCP protocol and dispatch logic
//! lives in `n8n-mcp-protocol`; this crate only assembles it.

pub mod cli;
