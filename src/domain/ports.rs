use crate::domain::connection::ConnectionSnapshot;
use crate::domain::credential::Credential;
use async_trait::async_trait;

/// Looks up the credential a connection claims during its handshake.
///
/// Absence is a normal result; the auth flow decides whether it rejects the
/// connection.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn resolve(&self, ident: &str) -> Option<Credential>;

    /// Called once before the broker starts accepting connections.
    async fn start(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once when the broker shuts down.
    fn close(&self) {}
}

/// The live connection set owned by the broker.
///
/// Implementations must return a consistent view: if the set is shared
/// between threads the snapshot is taken under a single read lock.
pub trait ConnectionSource: Send + Sync {
    fn snapshot(&self) -> Vec<ConnectionSnapshot>;
}
