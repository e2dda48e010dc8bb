//! Core building blocks for signing API requests.
//!
//! This crate carries everything that is independent of a concrete signing
//! scheme: the error type, hash and time helpers, the environment
//! abstraction used by credential providers, the [`ProvideCredential`] and
//! [`SigningCredential`] traits, and [`SigningRequest`], the mutable
//! decomposition of [`http::request::Parts`] that signers canonicalize and
//! write back.
//!
//! Scheme implementations live in their own crates and compose these
//! pieces; see `cloudsig-aws-v4` for the AWS V4 signer.

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

mod error;
pub use error::{Error, ErrorKind, Result};

pub mod hash;
pub mod time;
pub mod utils;

mod context;
pub use context::{Context, Env, NoopEnv, OsEnv, StaticEnv};

mod api;
pub use api::{ProvideCredential, SigningCredential};

mod request;
pub use request::SigningRequest;
