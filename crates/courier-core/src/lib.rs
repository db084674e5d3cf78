//! Shared leaf crate for the courier workspace: geographic primitives and
//! environment-driven application configuration.

mod app_config;
mod config;
pub mod geo;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
