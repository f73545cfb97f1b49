/// Read-only view of one live broker connection, as supplied by the
/// connection layer at scrape time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionSnapshot {
    /// Authenticated ident; `None` until the handshake completes
    pub identity: Option<String>,
    /// Owner of the authenticated credential, if any
    pub owner: Option<String>,
    /// Bytes queued for transmission
    pub send_buffer_bytes: u64,
    /// Bytes received but not yet parsed
    pub receive_buffer_bytes: u64,
}

impl ConnectionSnapshot {
    /// Snapshot of a connection that has not authenticated yet.
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    pub fn authenticated(ident: impl Into<String>, owner: Option<String>) -> Self {
        Self {
            identity: Some(ident.into()),
            owner,
            ..Self::default()
        }
    }

    /// The authenticated ident, treating an empty string as no ident.
    pub fn ident(&self) -> Option<&str> {
        self.identity.as_deref().filter(|ident| !ident.is_empty())
    }

    pub fn with_buffers(mut self, send_buffer_bytes: u64, receive_buffer_bytes: u64) -> Self {
        self.send_buffer_bytes = send_buffer_bytes;
        self.receive_buffer_bytes = receive_buffer_bytes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_identity_is_not_authenticated() {
        assert_eq!(ConnectionSnapshot::authenticated("", None).ident(), None);
        assert_eq!(ConnectionSnapshot::unauthenticated().ident(), None);
        assert_eq!(
            ConnectionSnapshot::authenticated("ident1", None).ident(),
            Some("ident1")
        );
    }
}
