use crate::domain::credential::Credential;
use crate::domain::ports::CredentialResolver;
use async_trait::async_trait;

/// Resolver that yields to the scheduler once before delegating.
///
/// Stands where a remote credential service would sit, so connection setup
/// is exercised against a lookup that actually suspends.
#[derive(Debug, Clone)]
pub struct YieldingResolver<R> {
    inner: R,
}

impl<R> YieldingResolver<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

#[async_trait]
impl<R: CredentialResolver> CredentialResolver for YieldingResolver<R> {
    async fn resolve(&self, ident: &str) -> Option<Credential> {
        tokio::task::yield_now().await;
        self.inner.resolve(ident).await
    }

    async fn start(&self) -> anyhow::Result<()> {
        self.inner.start().await
    }

    fn close(&self) {
        self.inner.close();
    }
}
