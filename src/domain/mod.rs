// Credential descriptors and resolved credentials
pub mod credential;

// Connection view supplied by the broker
pub mod connection;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
