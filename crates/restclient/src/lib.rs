//! REST Client (C7): typed façade over the host's workflow/execution API
//! plus a separately-configured webhook-trigger invoker.

mod clean;
mod client;
mod ssrf;
mod webhook;

pub use clean::{clean_for_create, clean_for_update};
pub use client::{ListWorkflowsQuery, RestClient};
pub use webhook::{trigger_webhook, WebhookInvocation};
