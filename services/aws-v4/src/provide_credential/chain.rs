use crate::Credential;
use async_trait::async_trait;
use cloudsig_core::{Context, Error, ProvideCredential, Result};
use std::fmt::{self, Debug};

/// A chain of credential providers that will be tried in order.
///
/// The first provider that yields a credential wins. A failing provider
/// does not abort the chain; its cause is kept, and when the whole chain
/// comes up empty after one or more failures, the collected causes surface
/// as a single credential error.
pub struct ProvideCredentialChain {
    providers: Vec<Box<dyn ProvideCredential<Credential = Credential>>>,
}

impl ProvideCredentialChain {
    /// Create a new empty credential provider chain.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Add a credential provider to the chain.
    pub fn push(
        mut self,
        provider: impl ProvideCredential<Credential = Credential> + 'static,
    ) -> Self {
        self.providers.push(Box::new(provider));
        self
    }
}

impl Default for ProvideCredentialChain {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for ProvideCredentialChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvideCredentialChain")
            .field("providers_count", &self.providers.len())
            .finish()
    }
}

#[async_trait]
impl ProvideCredential for ProvideCredentialChain {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let mut failures = Vec::new();

        for provider in &self.providers {
            log::debug!("trying credential provider: {provider:?}");

            match provider.provide_credential(ctx).await {
                Ok(Some(cred)) => {
                    log::debug!("loaded credential from provider: {provider:?}");
                    return Ok(Some(cred));
                }
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("credential provider {provider:?} failed: {e}");
                    failures.push(format!("{provider:?}: {e}"));
                }
            }
        }

        if failures.is_empty() {
            Ok(None)
        } else {
            Err(Error::credential_invalid(failures.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockSuccessProvider {
        access_key: String,
        secret_key: String,
    }

    #[async_trait]
    impl ProvideCredential for MockSuccessProvider {
        type Credential = Credential;

        async fn provide_credential(&self, _ctx: &Context) -> Result<Option<Self::Credential>> {
            Ok(Some(Credential {
                access_key_id: self.access_key.clone(),
                secret_access_key: self.secret_key.clone(),
                session_token: None,
                expires_in: None,
            }))
        }
    }

    impl Debug for MockSuccessProvider {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("MockSuccessProvider").finish()
        }
    }

    struct MockFailProvider(&'static str);

    #[async_trait]
    impl ProvideCredential for MockFailProvider {
        type Credential = Credential;

        async fn provide_credential(&self, _ctx: &Context) -> Result<Option<Self::Credential>> {
            Err(Error::credential_denied(self.0))
        }
    }

    impl Debug for MockFailProvider {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("MockFailProvider").finish()
        }
    }

    struct MockEmptyProvider;

    #[async_trait]
    impl ProvideCredential for MockEmptyProvider {
        type Credential = Credential;

        async fn provide_credential(&self, _ctx: &Context) -> Result<Option<Self::Credential>> {
            Ok(None)
        }
    }

    impl Debug for MockEmptyProvider {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("MockEmptyProvider").finish()
        }
    }

    #[tokio::test]
    async fn test_chain_returns_first_success() {
        let ctx = Context::new();

        let chain = ProvideCredentialChain::new()
            .push(MockFailProvider("token endpoint unreachable"))
            .push(MockEmptyProvider)
            .push(MockSuccessProvider {
                access_key: "test_key".to_string(),
                secret_key: "test_secret".to_string(),
            })
            .push(MockSuccessProvider {
                access_key: "should_not_be_used".to_string(),
                secret_key: "should_not_be_used".to_string(),
            });

        let cred = chain
            .provide_credential(&ctx)
            .await
            .expect("chain must succeed")
            .expect("credential must exist");
        assert_eq!(cred.access_key_id, "test_key");
        assert_eq!(cred.secret_access_key, "test_secret");
    }

    #[tokio::test]
    async fn test_chain_aggregates_failures() {
        let ctx = Context::new();

        let chain = ProvideCredentialChain::new()
            .push(MockFailProvider("token endpoint unreachable"))
            .push(MockEmptyProvider)
            .push(MockFailProvider("profile is malformed"));

        let err = chain
            .provide_credential(&ctx)
            .await
            .expect_err("chain with only failures must error");
        assert!(err.is_credential_error());
        assert!(err.to_string().contains("token endpoint unreachable"));
        assert!(err.to_string().contains("profile is malformed"));
    }

    #[tokio::test]
    async fn test_chain_all_empty_returns_none() {
        let ctx = Context::new();

        let chain = ProvideCredentialChain::new()
            .push(MockEmptyProvider)
            .push(MockEmptyProvider);

        assert!(chain
            .provide_credential(&ctx)
            .await
            .expect("chain must succeed")
            .is_none());
    }

    #[tokio::test]
    async fn test_empty_chain_returns_none() {
        let ctx = Context::new();

        let chain = ProvideCredentialChain::new();
        assert!(chain
            .provide_credential(&ctx)
            .await
            .expect("chain must succeed")
            .is_none());
    }
}
