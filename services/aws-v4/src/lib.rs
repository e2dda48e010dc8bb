//! AWS SigV4 request signing.
//!
//! The entry point is [`Signer`], which resolves credentials through a
//! [`ProvideCredential`](cloudsig_core::ProvideCredential) implementation
//! and signs requests with [`RequestSigner`]. Use [`RequestSigner`]
//! directly when credentials are already in hand.
//!
//! ```no_run
//! use cloudsig_aws_v4::{Payload, RequestOptions, RequestSigner, Signer, StaticCredentialProvider};
//! use cloudsig_core::Context;
//!
//! # async fn example() -> cloudsig_core::Result<()> {
//! let signer = Signer::new(
//!     Context::new(),
//!     StaticCredentialProvider::new("access_key_id", "secret_access_key"),
//!     RequestSigner::new("sqs", "us-east-1"),
//! );
//!
//! let req = http::Request::get("https://sqs.us-east-1.amazonaws.com/").body(())?;
//! let (mut parts, _) = req.into_parts();
//! signer
//!     .sign(&mut parts, Payload::Empty, &RequestOptions::default())
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod constants;

mod credential;
pub use credential::Credential;

mod payload;
pub use payload::Payload;

mod canonical;

mod sign_request;
pub use sign_request::{RequestOptions, RequestSigner};

mod signer;
pub use signer::Signer;

mod provide_credential;
pub use provide_credential::{
    DefaultCredentialProvider, EnvCredentialProvider, ProvideCredentialChain,
    StaticCredentialProvider,
};
