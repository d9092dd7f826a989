//! Stdio transport: newline-delimited JSON-RPC on stdin/stdout (§6).
//!
//! No per-request instance context in this mode — every call resolves
//! the process-wide singleton client. Grounded on the teacher's
//! `mcp-client::transport::StdioTransport` line-reading loop, inverted
//! for a server reading requests from stdin instead of a client reading
//! responses from a child process's stdout.

use crate::mcp::handle_request;
use crate::rpc::{JsonRpcRequest, JsonRpcResponse, PARSE_ERROR};
use crate::state::AppState;
use n8n_mcp_domain::instance::InstanceContext;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Runs the stdio server loop until stdin closes or `shutting_down` is set.
pub async fn serve(state: &AppState, shutting_down: &AtomicBool) -> std::io::Result<()> {
    let stdin = tokio::io::stdin();
    let mut reader = BufReader::new(stdin).lines();
    let mut stdout = tokio::io::stdout();
    let ctx = InstanceContext::default();

    while !shutting_down.load(Ordering::SeqCst) {
        let line = match reader.next_line().await? {
            Some(l) => l,
            None => break, // stdin closed
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<JsonRpcRequest>(trimmed) {
            Ok(req) => handle_request(state, &ctx, req).await,
            Err(e) => Some(JsonRpcResponse::failure(
                serde_json::Value::Null,
                PARSE_ERROR,
                format!("parse error: {e}"),
            )),
        };

        if let Some(resp) = response {
            let json = serde_json::to_string(&resp)?;
            stdout.write_all(json.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}
