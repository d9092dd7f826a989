use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sha2::{Digest, Sha256};
use tracing_subscriber::EnvFilter;

use n8n_mcp_domain::config::{Config, ConfigSeverity, TransportKind};
use n8n_mcp_gateway::cli::{Cli, Command, ConfigCommand};
use n8n_mcp_protocol::transport_http::HttpState;
use n8n_mcp_protocol::{transport_http, transport_stdio, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None | Some(Command::Serve) => {
            let (config, _path) = n8n_mcp_gateway::cli::load_config()?;
            init_tracing(&config);
            run(config).await
        }
        Some(Command::Doctor) => {
            let (config, path) = n8n_mcp_gateway::cli::load_config()?;
            let passed = n8n_mcp_gateway::cli::doctor::run(&config, &path).await?;
            if !passed {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            let (config, path) = n8n_mcp_gateway::cli::load_config()?;
            if !n8n_mcp_gateway::cli::config::validate(&config, &path) {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let (config, _path) = n8n_mcp_gateway::cli::load_config()?;
            n8n_mcp_gateway::cli::config::show(&config);
            Ok(())
        }
        Some(Command::Version) => {
            println!("n8n-mcp-gateway {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Structured JSON logging to stderr. Stdio transport reserves stdout
/// for the JSON-RPC wire protocol, so logs must never touch it.
fn init_tracing(config: &Config) {
    let default_filter = if config.production { "info" } else { "info,n8n_mcp_gateway=debug" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with_writer(std::io::stderr)
        .json()
        .init();
}

async fn run(config: Config) -> anyhow::Result<()> {
    tracing::info!(transport = ?config.transport, "n8n-mcp-gateway starting");

    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues.iter().filter(|i| i.severity == ConfigSeverity::Error).count()
        );
    }

    let state = Arc::new(AppState::new(config.n8n.clone(), config.cache.clone(), config.webhook_security));
    tracing::info!(catalog_size = state.catalog.len(), "node catalog loaded");

    let shutting_down = Arc::new(AtomicBool::new(false));
    tokio::spawn(watch_for_shutdown(shutting_down.clone()));

    match config.transport {
        TransportKind::Stdio => {
            tracing::info!("serving MCP over stdio");
            transport_stdio::serve(&state, &shutting_down).await.context("stdio transport")?;
        }
        TransportKind::Http => {
            let auth_token_hash = match &config.auth_token {
                Some(token) if !token.is_empty() => {
                    tracing::info!(env_var = %config.auth.api_token_env, "bearer-token auth enabled");
                    Some(Sha256::digest(token.as_bytes()).into())
                }
                _ => {
                    tracing::warn!(
                        env_var = %config.auth.api_token_env,
                        "bearer-token auth DISABLED — set this env var to require one"
                    );
                    None
                }
            };

            let http_state = HttpState { app: state.clone(), auth_token_hash };
            let app = transport_http::build_router(http_state, config.server.rate_limit.as_ref());

            let addr = format!("{}:{}", config.server.host, config.server.port);
            let listener = tokio::net::TcpListener::bind(&addr).await.with_context(|| format!("binding to {addr}"))?;
            tracing::info!(addr = %addr, "serving MCP over HTTP");

            let shutdown_flag = shutting_down.clone();
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    while !shutdown_flag.load(Ordering::SeqCst) {
                        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                    }
                })
                .await
                .context("axum server error")?;
        }
    }

    tracing::info!("n8n-mcp-gateway stopped");
    Ok(())
}

/// Waits for SIGINT/SIGTERM (or Ctrl+C on platforms without signal
/// handling) and flips the shared shutdown flag. Transports poll the
/// flag between requests rather than being hard-killed mid-request, so
/// the caller gets to finish whatever it is doing — within a short soft
/// deadline the process is expected to honor on its own.
async fn watch_for_shutdown(flag: Arc<AtomicBool>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        let mut int = signal(SignalKind::interrupt()).expect("install SIGINT handler");
        tokio::select! {
            _ = term.recv() => tracing::info!("received SIGTERM"),
            _ = int.recv() => tracing::info!("received SIGINT"),
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("received ctrl-c");
    }
    flag.store(true, Ordering::SeqCst);
}
