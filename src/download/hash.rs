//! Hashing primitives used for integrity verification.
//!
//! This module provides the supported [`HashAlgorithm`]s, the [`Digest`] value
//! type, and [`HashingTransform`], which hashes bytes with several algorithms
//! at once while the caller keeps using the bytes unmodified.
//!
//! # Examples
//!
//! ## Hash Type Detection
//!
//! ```rust
//! use packfetch::download::hash::{detect_hash_type, HashAlgorithm};
//!
//! assert_eq!(
//!     detect_hash_type("da39a3ee5e6b4b0d3255bfef95601890afd80709"),
//!     Some(HashAlgorithm::Sha1)
//! );
//! assert_eq!(detect_hash_type("invalid"), None);
//! ```
//!
//! ## Streaming
//!
//! ```rust
//! use packfetch::download::hash::{HashAlgorithm, HashingTransform};
//!
//! let mut transform = HashingTransform::new([HashAlgorithm::Sha1, HashAlgorithm::Md5]);
//! let chunk = transform.update(b"hello ");
//! assert_eq!(chunk, b"hello ");
//! transform.update(b"world");
//! let digests = transform.finish();
//! assert_eq!(
//!     digests[&HashAlgorithm::Md5].to_string(),
//!     "5eb63bbbe01eeed093cb22bb8f5acdc3"
//! );
//! ```

use crate::error::{Error, Result};

use serde::{Deserialize, Serialize};
use sha2::Digest as _;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tokio::io::AsyncReadExt;

const READ_BUF_SIZE: usize = 64 * 1024;

/// Supported hash algorithms for file verification.
///
/// The declaration order is also the order in which companion hash files are
/// probed, strongest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-512 hash algorithm
    Sha512,
    /// SHA-256 hash algorithm
    Sha256,
    /// SHA-1 hash algorithm, used by Mojang's manifests
    Sha1,
    /// MD5 hash algorithm
    Md5,
}

impl HashAlgorithm {
    /// Every supported algorithm, strongest first.
    pub const ALL: [HashAlgorithm; 4] = [
        HashAlgorithm::Sha512,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha1,
        HashAlgorithm::Md5,
    ];

    /// Length of a digest in bytes.
    pub fn digest_len(self) -> usize {
        match self {
            HashAlgorithm::Sha512 => 64,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Md5 => 16,
        }
    }

    /// The conventional file extension of a companion hash file.
    pub fn extension(self) -> &'static str {
        match self {
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Md5 => "md5",
        }
    }

    /// Create a fresh streaming hasher for this algorithm.
    pub fn hasher(self) -> Hasher {
        match self {
            HashAlgorithm::Sha512 => Hasher::Sha512(Default::default()),
            HashAlgorithm::Sha256 => Hasher::Sha256(Default::default()),
            HashAlgorithm::Sha1 => Hasher::Sha1(Default::default()),
            HashAlgorithm::Md5 => Hasher::Md5(Default::default()),
        }
    }

    /// Hash a byte slice in one go.
    pub fn digest(self, data: &[u8]) -> Digest {
        let mut hasher = self.hasher();
        hasher.update(data);
        hasher.finalize()
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "sha512" => Ok(HashAlgorithm::Sha512),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha1" => Ok(HashAlgorithm::Sha1),
            "md5" => Ok(HashAlgorithm::Md5),
            other => Err(Error::Internal(format!(
                "Unsupported hash algorithm: {}",
                other
            ))),
        }
    }
}

/// Detect the hash algorithm of a hex digest from its length.
///
/// Returns `None` when the string is not hexadecimal or has a length no
/// supported algorithm produces.
pub fn detect_hash_type(hash: &str) -> Option<HashAlgorithm> {
    if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    HashAlgorithm::ALL
        .into_iter()
        .find(|algorithm| algorithm.digest_len() * 2 == hash.len())
}

/// A raw digest value.
///
/// Displayed and parsed as lowercase hexadecimal.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Digest(Vec<u8>);

impl Digest {
    /// Parse a hex digest, accepting either case.
    pub fn from_hex(hex_digest: &str) -> Result<Self> {
        hex::decode(hex_digest.trim())
            .map(Digest)
            .map_err(|e| Error::Internal(format!("Invalid hex digest {:?}: {}", hex_digest, e)))
    }

    /// Parse a hex digest and check that it fits the algorithm.
    pub fn for_algorithm(algorithm: HashAlgorithm, hex_digest: &str) -> Result<Self> {
        let digest = Digest::from_hex(hex_digest)?;
        if digest.0.len() != algorithm.digest_len() {
            return Err(Error::Internal(format!(
                "Invalid {} digest length: expected {} bytes, got {}",
                algorithm,
                algorithm.digest_len(),
                digest.0.len()
            )));
        }
        Ok(digest)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self)
    }
}

/// A streaming hasher for one algorithm.
#[derive(Clone)]
pub enum Hasher {
    Sha512(sha2::Sha512),
    Sha256(sha2::Sha256),
    Sha1(sha1::Sha1),
    Md5(md5::Md5),
}

impl Hasher {
    /// Feed more bytes.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Sha512(h) => h.update(data),
            Hasher::Sha256(h) => h.update(data),
            Hasher::Sha1(h) => h.update(data),
            Hasher::Md5(h) => h.update(data),
        }
    }

    /// Consume the hasher and produce the digest.
    pub fn finalize(self) -> Digest {
        match self {
            Hasher::Sha512(h) => Digest(h.finalize().to_vec()),
            Hasher::Sha256(h) => Digest(h.finalize().to_vec()),
            Hasher::Sha1(h) => Digest(h.finalize().to_vec()),
            Hasher::Md5(h) => Digest(h.finalize().to_vec()),
        }
    }
}

/// Hashes bytes with several algorithms while letting them pass through.
#[derive(Clone, Default)]
pub struct HashingTransform {
    hashers: Vec<(HashAlgorithm, Hasher)>,
    bytes: u64,
}

impl HashingTransform {
    /// Create a transform computing every given algorithm. Duplicates are ignored.
    pub fn new(algorithms: impl IntoIterator<Item = HashAlgorithm>) -> Self {
        let mut hashers: Vec<(HashAlgorithm, Hasher)> = Vec::new();
        for algorithm in algorithms {
            if !hashers.iter().any(|(a, _)| *a == algorithm) {
                hashers.push((algorithm, algorithm.hasher()));
            }
        }
        Self { hashers, bytes: 0 }
    }

    /// Hash `data` and hand it back untouched.
    pub fn update<'a>(&mut self, data: &'a [u8]) -> &'a [u8] {
        for (_, hasher) in &mut self.hashers {
            hasher.update(data);
        }
        self.bytes += data.len() as u64;
        data
    }

    /// Number of bytes seen so far.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Whether the transform computes any digest at all.
    pub fn is_empty(&self) -> bool {
        self.hashers.is_empty()
    }

    /// Finish every hasher.
    pub fn finish(self) -> BTreeMap<HashAlgorithm, Digest> {
        self.hashers
            .into_iter()
            .map(|(algorithm, hasher)| (algorithm, hasher.finalize()))
            .collect()
    }
}

/// Feed an existing file through a transform, e.g. the already-downloaded
/// prefix of a resumed transfer.
pub async fn hash_into(path: &Path, transform: &mut HashingTransform) -> Result<()> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| Error::local_io(path, e))?;
    let mut buf = vec![0u8; READ_BUF_SIZE];
    loop {
        let n = file
            .read(&mut buf)
            .await
            .map_err(|e| Error::local_io(path, e))?;
        if n == 0 {
            break;
        }
        transform.update(&buf[..n]);
    }
    Ok(())
}

/// Compute the digests of a local file for the given algorithms.
pub async fn hash_file(
    path: &Path,
    algorithms: impl IntoIterator<Item = HashAlgorithm>,
) -> Result<BTreeMap<HashAlgorithm, Digest>> {
    let mut transform = HashingTransform::new(algorithms);
    hash_into(path, &mut transform).await?;
    Ok(transform.finish())
}
