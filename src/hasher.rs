//! SHA-256 digests of files and in-memory buffers.
//!
//! Files are streamed through the hash state in fixed-size chunks, so memory
//! use stays bounded by the chunk size regardless of file size.

use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::str::FromStr;

use sha2::{Digest as _, Sha256};

use crate::error::{Error, Result};

/// Chunk size used when streaming a file through SHA-256.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Length of a SHA-256 output in bytes.
pub const DIGEST_LEN: usize = 32;

/// A SHA-256 output.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl FromStr for Digest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.strip_prefix("sha256:").unwrap_or(s);
        let mut out = [0u8; DIGEST_LEN];
        hex::decode_to_slice(s, &mut out)?;
        Ok(Self(out))
    }
}

/// Hash a buffer in one shot. Text should be passed as its UTF-8 bytes
/// (`&str` and `String` already satisfy `AsRef<[u8]>`).
pub fn digest_bytes(data: impl AsRef<[u8]>) -> Digest {
    Digest(Sha256::digest(data.as_ref()).into())
}

/// Stream a file through SHA-256 using [`DEFAULT_CHUNK_SIZE`] reads.
pub fn digest_file(path: impl AsRef<Path>) -> Result<Digest> {
    digest_file_chunked(path, DEFAULT_CHUNK_SIZE)
}

/// Stream a file through SHA-256 using reads of at most `chunk_size` bytes.
pub fn digest_file_chunked(path: impl AsRef<Path>, chunk_size: usize) -> Result<Digest> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let digest = digest_reader(file, chunk_size)?;
    log::trace!("hashed {} -> {}", path.display(), digest);
    Ok(digest)
}

/// Hash everything readable from `reader`.
///
/// A read failure aborts the whole computation; no partial digest is returned.
pub fn digest_reader<R: Read>(mut reader: R, chunk_size: usize) -> Result<Digest> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; chunk_size.max(1)];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        hasher.update(&buf[..n]);
    }
    Ok(Digest(hasher.finalize().into()))
}
