use std::sync::{Arc, Mutex};

use http::request::Parts;
use log::debug;

use cloudsig_core::{Context, Error, ProvideCredential, Result, SigningCredential};

use crate::payload::Payload;
use crate::sign_request::{RequestOptions, RequestSigner};
use crate::Credential;

/// Signer is the entry point used to sign requests.
///
/// It resolves credentials through the configured provider, caches them
/// for as long as they stay valid, and hands the canonicalization and
/// signature work to [`RequestSigner`]. Clones are cheap and share the
/// credential cache. A request that cannot be signed fails; it is never
/// sent on unsigned.
#[derive(Clone, Debug)]
pub struct Signer {
    ctx: Context,
    provider: Arc<dyn ProvideCredential<Credential = Credential>>,
    signer: RequestSigner,
    credential: Arc<Mutex<Option<Credential>>>,
}

impl Signer {
    /// Create a new signer.
    pub fn new(
        ctx: Context,
        provider: impl ProvideCredential<Credential = Credential>,
        signer: RequestSigner,
    ) -> Self {
        Self {
            ctx,
            provider: Arc::new(provider),
            signer,
            credential: Arc::new(Mutex::new(None)),
        }
    }

    /// Sign the request: resolve credentials, add the protocol headers and
    /// the `authorization` header, and return the authorization value.
    ///
    /// Mutates the request. One-shot: re-sign every retry attempt, since
    /// the timestamp is covered by the signature.
    pub async fn sign(
        &self,
        parts: &mut Parts,
        payload: Payload,
        opts: &RequestOptions,
    ) -> Result<String> {
        let cred = self.credential().await?;

        self.signer.sign(parts, payload, opts, &cred).await
    }

    /// Compute the raw signature for the request without mutating it.
    pub async fn signature(
        &self,
        parts: &Parts,
        payload: Payload,
        opts: &RequestOptions,
    ) -> Result<String> {
        let cred = self.credential().await?;

        self.signer
            .calculate_signature(parts, payload, opts, &cred)
            .await
    }

    /// Drop the cached credential.
    ///
    /// Call this when the remote peer rejects a request as unauthenticated
    /// (401/403) so the next attempt resolves fresh credentials.
    pub fn invalidate(&self) {
        *self.credential.lock().expect("lock poisoned") = None;
    }

    async fn credential(&self) -> Result<Credential> {
        let cached = self.credential.lock().expect("lock poisoned").clone();
        if cached.is_valid() {
            return Ok(cached.expect("valid credential must be present"));
        }

        debug!("no valid cached credential, resolving through provider");
        match self.provider.provide_credential(&self.ctx).await? {
            Some(cred) => {
                *self.credential.lock().expect("lock poisoned") = Some(cred.clone());
                Ok(cred)
            }
            None => Err(Error::credential_invalid(
                "credential provider returned no credentials",
            )),
        }
    }
}
