//! Content fingerprints
//!
//! A fingerprint is the SHA-256 digest of a file's full byte content, rendered
//! as lowercase hex. Identical bytes always produce the same fingerprint, which
//! is what lets two differently named files converge on one remote object.

use crate::error::{CommonError, Result};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Read buffer used when streaming a file through the hasher.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Length of a hex-encoded SHA-256 digest.
const HEX_LEN: usize = 64;

/// Hex-encoded SHA-256 digest of some content
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint an in-memory buffer
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(data)))
    }

    /// Stream any async reader through the hasher without buffering it whole
    pub async fn from_reader<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Self> {
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; READ_BUFFER_SIZE];

        loop {
            let bytes_read = reader.read(&mut buffer).await?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(Self(hex::encode(hasher.finalize())))
    }

    /// Fingerprint a file on disk.
    ///
    /// A file that does not exist surfaces as an IO error for which
    /// [`CommonError::is_not_found`] is true.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = tokio::fs::File::open(path.as_ref()).await?;
        Self::from_reader(&mut file).await
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = CommonError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let valid = s.len() == HEX_LEN
            && s
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));

        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(CommonError::InvalidFingerprint(s.to_string()))
        }
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
