//! Vaultshare Server Library
//!
//! Shared vault access control: roles, invitations and share links over a
//! redb store, exposed through an axum router.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod security;
pub mod services;

pub use config::Config;
pub use db::{open_database, Db};
pub use error::{AppError, Result};
pub use security::SecretHasher;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Config,
    pub hasher: SecretHasher,
}

impl AppState {
    /// Create a new AppState; the passcode hasher is keyed from the config
    pub fn new(db: Db, config: Config) -> Self {
        let hasher = SecretHasher::new(&config.passcode_pepper);
        Self { db, config, hasher }
    }
}
