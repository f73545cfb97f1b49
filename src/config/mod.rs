//! Configuration module for the broker core.
//!
//! Configuration is loaded from environment variables, organized by concern:
//! Auth and Metrics.

mod auth_config;
mod metrics_config;

pub use auth_config::AuthEnvConfig;
pub use metrics_config::MetricsEnvConfig;

use crate::infrastructure::auth::{CredentialStore, load_credentials};
use anyhow::{Context, Result};
use tracing::warn;

/// Main process configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub auth: AuthEnvConfig,
    pub metrics: MetricsEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            auth: AuthEnvConfig::from_env(),
            metrics: MetricsEnvConfig::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        match &self.auth.credentials_file {
            Some(path) if !path.exists() => {
                anyhow::bail!("CREDENTIALS_FILE {} does not exist", path.display())
            }
            _ => Ok(()),
        }
    }

    /// Build the credential store this configuration points at.
    ///
    /// Without a credentials file the store is empty and every ident is
    /// rejected by the auth flow.
    pub fn credential_store(&self) -> Result<CredentialStore> {
        match &self.auth.credentials_file {
            Some(path) => load_credentials(path)
                .with_context(|| format!("Failed to load credentials from {}", path.display())),
            None => {
                warn!("No CREDENTIALS_FILE set; every connection will fail authentication");
                Ok(CredentialStore::default())
            }
        }
    }
}
