//! Request payload hashing.

use std::fmt::{self, Debug, Formatter};

use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt};

use cloudsig_core::hash::{hex_sha256, Sha256Digest};
use cloudsig_core::Result;

use crate::constants::EMPTY_PAYLOAD_SHA256;

// Read buffer tiers for the streaming hash.
const CHUNK_MIN: usize = 4 * 1024;
const CHUNK_SMALL: usize = 16 * 1024;
const CHUNK_MEDIUM: usize = 64 * 1024;
const CHUNK_LARGE: usize = 256 * 1024;

/// The request body as the signer sees it.
///
/// The in-memory variants hash synchronously; only [`Payload::Stream`]
/// suspends. Hashing consumes a stream, so callers that retry must either
/// hand over a re-readable source or carry the precomputed payload in
/// [`RequestOptions`](crate::RequestOptions).
pub enum Payload {
    /// No request body.
    Empty,
    /// Body fully available in memory.
    Bytes(Bytes),
    /// Body only available as an async byte stream.
    Stream {
        /// The byte stream that will be transmitted.
        reader: Box<dyn AsyncRead + Send + Unpin>,
        /// Declared content length, if known. Scales the read buffer.
        content_length: Option<u64>,
    },
}

impl Payload {
    /// Wrap an in-memory body.
    pub fn bytes(content: impl Into<Bytes>) -> Self {
        Payload::Bytes(content.into())
    }

    /// Wrap an async byte stream with an optional declared length.
    pub fn stream(
        reader: impl AsyncRead + Send + Unpin + 'static,
        content_length: Option<u64>,
    ) -> Self {
        Payload::Stream {
            reader: Box::new(reader),
            content_length,
        }
    }

    /// Hex SHA-256 of the exact bytes that will be transmitted.
    pub async fn sha256_hex(self) -> Result<String> {
        match self {
            Payload::Empty => Ok(EMPTY_PAYLOAD_SHA256.to_string()),
            Payload::Bytes(bytes) => Ok(hex_sha256(&bytes)),
            Payload::Stream {
                reader,
                content_length,
            } => Ok(sha256_reader(reader, content_length).await?.to_hex()),
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Empty
    }
}

impl Debug for Payload {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Empty => f.write_str("Payload::Empty"),
            Payload::Bytes(bytes) => write!(f, "Payload::Bytes({} bytes)", bytes.len()),
            Payload::Stream { content_length, .. } => {
                write!(f, "Payload::Stream(content_length: {content_length:?})")
            }
        }
    }
}

impl From<Bytes> for Payload {
    fn from(content: Bytes) -> Self {
        Payload::Bytes(content)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(content: Vec<u8>) -> Self {
        Payload::Bytes(content.into())
    }
}

impl From<String> for Payload {
    fn from(content: String) -> Self {
        Payload::Bytes(content.into())
    }
}

impl From<&'static str> for Payload {
    fn from(content: &'static str) -> Self {
        Payload::Bytes(content.into())
    }
}

/// Hash a stream chunk by chunk without materializing it.
///
/// Read errors propagate unchanged; partial hash state is discarded with
/// the hasher.
async fn sha256_reader(
    mut reader: impl AsyncRead + Unpin,
    content_length: Option<u64>,
) -> Result<Sha256Digest> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; chunk_size(content_length)];

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(Sha256Digest::from(<[u8; 32]>::from(hasher.finalize())))
}

/// Pick the read buffer size from the declared content length. Unknown
/// lengths read in the smallest chunks.
fn chunk_size(content_length: Option<u64>) -> usize {
    match content_length {
        None => CHUNK_MIN,
        Some(n) if n <= 1024 * 1024 => CHUNK_SMALL,
        Some(n) if n <= 64 * 1024 * 1024 => CHUNK_MEDIUM,
        Some(_) => CHUNK_LARGE,
    }
}
