//! Credential file loading.
//!
//! Top-level tables are idents:
//!
//! ```toml
//! [ident1]
//! secret = "somesecret"
//! pubchans = ["channel1"]
//! subchans = ["channel2"]
//! owner = "youruser"
//! ```
//!
//! Files ending in `.json` are parsed as a JSON object of the same shape.

use super::memory::CredentialStore;
use crate::domain::credential::CredentialDescriptor;
use crate::domain::errors::CredentialError;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

type CredentialMap = HashMap<String, CredentialDescriptor>;

/// Parse TOML credential text into a store.
pub fn parse_toml(text: &str, path: &Path) -> Result<CredentialStore, CredentialError> {
    let creds: CredentialMap = toml::from_str(text).map_err(|source| CredentialError::Toml {
        path: path.to_path_buf(),
        source,
    })?;
    build(creds)
}

/// Parse JSON credential text into a store.
pub fn parse_json(text: &str, path: &Path) -> Result<CredentialStore, CredentialError> {
    let creds: CredentialMap =
        serde_json::from_str(text).map_err(|source| CredentialError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    build(creds)
}

/// Load a credential store from disk, picking the format by extension.
pub fn load_credentials(path: &Path) -> Result<CredentialStore, CredentialError> {
    let text = fs::read_to_string(path).map_err(|source| CredentialError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let store = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => parse_json(&text, path)?,
        _ => parse_toml(&text, path)?,
    };

    info!(
        "Loaded {} credentials from {}",
        store.len(),
        path.display()
    );
    Ok(store)
}

fn build(creds: CredentialMap) -> Result<CredentialStore, CredentialError> {
    if let Some((ident, _)) = creds.iter().find(|(_, d)| d.secret.is_empty()) {
        return Err(CredentialError::EmptySecret {
            ident: ident.clone(),
        });
    }
    Ok(CredentialStore::new(creds))
}
