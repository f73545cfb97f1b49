//! Credential resolution for incoming connections

pub mod loader;
pub mod memory;
pub mod yielding;

pub use loader::load_credentials;
pub use memory::CredentialStore;
pub use yielding::YieldingResolver;
