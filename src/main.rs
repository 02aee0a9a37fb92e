//! AlgoClone · clone-coding practice backend
//!
//! - Axum HTTP + WebSocket API (one practice session per WebSocket connection)
//! - Remote code review through an OpenAI-compatible service
//! - Static frontend fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                 : u16 (default 3000)
//!   OPENAI_API_KEY       : evaluation credential, read on every review
//!   REVIEW_API_KEY_ENV   : name of the credential variable (default "OPENAI_API_KEY")
//!   OPENAI_BASE_URL      : default "https://api.openai.com/v1"
//!   OPENAI_REVIEW_MODEL  : default "gpt-4o-mini"
//!   REVIEW_TIMEOUT_SECS  : bounded wait for one review (default 30)
//!   REVIEW_TEMPERATURE   : sampling temperature (default 0.1)
//!   AGENT_CONFIG_PATH    : path to TOML config (prompts, messages, problem bank)
//!   LOG_LEVEL            : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT           : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod error;
mod config;
mod catalog;
mod prompt;
mod review;
mod session;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared read-only state: catalog, prompts, messages, review client.
  let state = Arc::new(AppState::new());

  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "algoclone", %addr, problems = state.catalog.len(), "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "algoclone", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "algoclone", error = %e, "Failed to listen for Ctrl-C");
    std::future::pending::<()>().await;
  }
}
