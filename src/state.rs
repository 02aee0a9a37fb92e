//! Application state shared by every connection: catalog, prompts, messages and
//! the review client. Read-only after startup; per-learner mutable state lives in
//! `session::Session`, owned by each WebSocket connection.

use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::catalog::{seed_problems, Catalog};
use crate::config::{load_agent_config_from_env, Messages, Prompts, ReviewSettings};
use crate::error::ConfigError;
use crate::review::{Credential, OpenAiBackend, ReviewBackend, ReviewClient};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub prompts: Prompts,
    pub messages: Messages,
    /// `Err` only if the HTTP client could not be built; every review then
    /// reports that startup error.
    pub reviewer: Result<ReviewClient, ConfigError>,
}

impl AppState {
    /// Build state from env: load config, build the catalog, init the review client.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_agent_config_from_env().unwrap_or_default();
        let catalog = Catalog::with_bank(seed_problems(), &cfg.problems);
        info!(target: "catalog", problems = catalog.len(), "Startup catalog inventory");

        let settings = ReviewSettings::from_env();
        let reviewer = match OpenAiBackend::new(&settings) {
            Ok(backend) => {
                let backend: Arc<dyn ReviewBackend> = Arc::new(backend);
                if std::env::var(&settings.api_key_env).is_err() {
                    // Not fatal at startup; every review attempt checks again.
                    error!(target: "algoclone", var = %settings.api_key_env, "Evaluation credential not set; reviews will fail until it is.");
                }
                info!(target: "algoclone", base_url = %settings.base_url, model = %settings.model, timeout = ?settings.timeout, "Review client ready.");
                Ok(ReviewClient::new(
                    backend,
                    Credential::Env(settings.api_key_env.clone()),
                    settings.timeout,
                    cfg.messages.review_failed.clone(),
                ))
            }
            Err(e) => {
                error!(target: "algoclone", error = %e, "Review client unavailable.");
                Err(e)
            }
        };

        Self { catalog, prompts: cfg.prompts, messages: cfg.messages, reviewer }
    }

    /// State with an explicit review client and default prompts/messages.
    #[cfg(test)]
    pub fn with_reviewer(catalog: Catalog, reviewer: Result<ReviewClient, ConfigError>) -> Self {
        Self {
            catalog,
            prompts: Prompts::default(),
            messages: Messages::default(),
            reviewer,
        }
    }
}
