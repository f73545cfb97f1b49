//! In-memory credential store
//!
//! The store is built once at startup and is read-only afterwards, so it
//! needs no locking. It is also the direct [`CredentialResolver`] variant:
//! resolution never suspends.

use crate::domain::credential::{Credential, CredentialDescriptor};
use crate::domain::ports::CredentialResolver;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

/// Map of ident to stored credential.
///
/// ```
/// use hpfeeds_broker::domain::credential::CredentialDescriptor;
/// use hpfeeds_broker::infrastructure::auth::CredentialStore;
///
/// let store = CredentialStore::new([(
///     "ident1",
///     CredentialDescriptor::new("somesecret", ["channel1"], ["channel2"], "youruser"),
/// )]);
/// assert_eq!(store.lookup("ident1").unwrap().ident(), "ident1");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    creds: HashMap<String, CredentialDescriptor>,
}

impl CredentialStore {
    pub fn new<I, K>(creds: I) -> Self
    where
        I: IntoIterator<Item = (K, CredentialDescriptor)>,
        K: Into<String>,
    {
        Self {
            creds: creds.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Synchronous lookup. Returns a fresh [`Credential`] carrying `ident`.
    pub fn lookup(&self, ident: &str) -> Option<Credential> {
        let found = self
            .creds
            .get(ident)
            .map(|descriptor| Credential::from_descriptor(ident, descriptor));
        debug!(ident, found = found.is_some(), "credential lookup");
        found
    }

    pub fn len(&self) -> usize {
        self.creds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creds.is_empty()
    }

    pub fn idents(&self) -> impl Iterator<Item = &str> {
        self.creds.keys().map(String::as_str)
    }
}

#[async_trait]
impl CredentialResolver for CredentialStore {
    async fn resolve(&self, ident: &str) -> Option<Credential> {
        self.lookup(ident)
    }
}
