use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building a credential store from a file
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Failed to read credentials file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in credentials file {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid JSON in credentials file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Credential for {ident} has an empty secret")]
    EmptySecret { ident: String },
}

/// Errors raised by the metrics exporter
#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("Failed to register collector: {0}")]
    Registration(#[from] prometheus::Error),

    #[error("Failed to bind metrics listener on {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },
}
