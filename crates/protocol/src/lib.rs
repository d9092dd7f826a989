//! MCP JSON-RPC framing (§6) and the Tool Dispatch Layer (C8, §4.8).

mod envelope;
mod mcp;
mod rpc;
mod state;
mod tools;
pub mod transport_http;
pub mod transport_stdio;

pub use envelope::Envelope;
pub use mcp::handle_request;
pub use rpc::{JsonRpcRequest, JsonRpcResponse};
pub use state::AppState;
pub use tools::dispatch;
