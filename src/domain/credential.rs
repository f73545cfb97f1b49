use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Stored credential for one identity.
///
/// The backing store is keyed by ident, so the descriptor itself never
/// carries it. A [`Credential`] is built from a descriptor at resolution time.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CredentialDescriptor {
    pub secret: String,
    #[serde(default)]
    pub pubchans: BTreeSet<String>,
    #[serde(default)]
    pub subchans: BTreeSet<String>,
    #[serde(default)]
    pub owner: String,
}

impl CredentialDescriptor {
    pub fn new<P, S>(secret: impl Into<String>, pubchans: P, subchans: S, owner: impl Into<String>) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        Self {
            secret: secret.into(),
            pubchans: pubchans.into_iter().map(Into::into).collect(),
            subchans: subchans.into_iter().map(Into::into).collect(),
            owner: owner.into(),
        }
    }
}

impl fmt::Debug for CredentialDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialDescriptor")
            .field("secret", &"<redacted>")
            .field("pubchans", &self.pubchans)
            .field("subchans", &self.subchans)
            .field("owner", &self.owner)
            .finish()
    }
}

/// A resolved credential: the stored descriptor plus the ident it was
/// looked up under.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    ident: String,
    secret: String,
    pubchans: BTreeSet<String>,
    subchans: BTreeSet<String>,
    owner: String,
}

impl Credential {
    /// Combine a stored descriptor with the ident used to find it.
    pub fn from_descriptor(ident: impl Into<String>, descriptor: &CredentialDescriptor) -> Self {
        Self {
            ident: ident.into(),
            secret: descriptor.secret.clone(),
            pubchans: descriptor.pubchans.clone(),
            subchans: descriptor.subchans.clone(),
            owner: descriptor.owner.clone(),
        }
    }

    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn pubchans(&self) -> &BTreeSet<String> {
        &self.pubchans
    }

    pub fn subchans(&self) -> &BTreeSet<String> {
        &self.subchans
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Whether this identity may publish to `chan`.
    pub fn may_publish(&self, chan: &str) -> bool {
        self.pubchans.contains(chan)
    }

    /// Whether this identity may subscribe to `chan`.
    pub fn may_subscribe(&self, chan: &str) -> bool {
        self.subchans.contains(chan)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("ident", &self.ident)
            .field("secret", &"<redacted>")
            .field("pubchans", &self.pubchans)
            .field("subchans", &self.subchans)
            .field("owner", &self.owner)
            .finish()
    }
}
