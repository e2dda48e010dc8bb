use crate::Context;
use std::fmt::Debug;

/// SigningCredential is implemented by credential types a signer can use.
///
/// Validity covers both shape (required fields present) and lifetime
/// (not expired); the façade consults it before reusing a cached value.
pub trait SigningCredential: Clone + Debug + Send + Sync + Unpin + 'static {
    /// Check whether this credential can still sign requests.
    fn is_valid(&self) -> bool;
}

impl<T: SigningCredential> SigningCredential for Option<T> {
    fn is_valid(&self) -> bool {
        let Some(cred) = self else {
            return false;
        };

        cred.is_valid()
    }
}

/// ProvideCredential loads credentials from the environment.
///
/// Services require different credentials to sign requests: most need an
/// access key pair, some add a session token. Providers fetch them from
/// wherever they live — process environment, static configuration, or an
/// external service — and may suspend while doing so.
#[async_trait::async_trait]
pub trait ProvideCredential: Debug + Send + Sync + Unpin + 'static {
    /// Credential returned by this provider.
    type Credential: Send + Sync + Unpin + 'static;

    /// Load a credential from the current environment.
    ///
    /// Returns `Ok(None)` when this source has nothing to offer, letting a
    /// chain continue; errors mean the source exists but failed.
    async fn provide_credential(&self, ctx: &Context) -> crate::Result<Option<Self::Credential>>;
}
