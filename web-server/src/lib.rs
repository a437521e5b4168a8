// web-server/src/lib.rs
pub mod api;
pub mod chain;
pub mod client_registry;
pub mod discord;
pub mod error;
pub mod middleware;
pub mod oauth;
pub mod static_files;
pub mod utils;
pub mod views;

use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use common::Config;
use thiserror::Error;

use crate::chain::{BalanceReader, ChainError, EditionDrop};
use crate::discord::DiscordClient;

// Applies to every outbound call; there are no retries
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to build Discord client: {0}")]
    Discord(#[from] reqwest::Error),
    #[error("failed to set up edition drop reader: {0}")]
    Chain(#[from] ChainError),
}

/// Outbound clients shared by all workers
pub struct GateServices {
    pub discord: DiscordClient,
    pub edition_drop: Arc<dyn BalanceReader>,
}

impl GateServices {
    pub fn from_config(config: &Config) -> Result<Self, SetupError> {
        Ok(Self {
            discord: DiscordClient::new(&config.discord, UPSTREAM_TIMEOUT)?,
            edition_drop: Arc::new(EditionDrop::new(&config.wallet, UPSTREAM_TIMEOUT)?),
        })
    }
}

/// Register every route. App data (`Config`, the registry address and
/// `GateServices`) is attached by the caller.
pub fn routes(config: &Config) -> impl FnOnce(&mut web::ServiceConfig) + '_ {
    move |cfg: &mut web::ServiceConfig| {
        cfg.service(views::index);
        api::configure(cfg);
        static_files::configure(cfg, &config.static_files);
    }
}
