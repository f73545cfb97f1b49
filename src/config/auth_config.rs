//! Credential source configuration parsing from environment variables.

use std::env;
use std::path::PathBuf;

/// Credential environment configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthEnvConfig {
    /// TOML or JSON file mapping idents to credentials
    pub credentials_file: Option<PathBuf>,
    /// Put a scheduler yield in front of every lookup
    pub yielding_resolver: bool,
}

impl AuthEnvConfig {
    pub fn from_env() -> Self {
        Self {
            credentials_file: env::var("CREDENTIALS_FILE")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            yielding_resolver: env::var("CREDENTIALS_YIELDING")
                .ok()
                .and_then(|v| v.parse::<bool>().ok())
                .unwrap_or(false),
        }
    }
}
