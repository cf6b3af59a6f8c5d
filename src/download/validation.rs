//! Correctness criteria for a destination file.
//!
//! A [`ValidationSpec`] says what a finished download must look like: an
//! optional exact size, zero or more digests that must all match, and whether
//! conditional requests (ETag, Last-Modified) may be used to skip the
//! transfer entirely.
//!
//! # Examples
//!
//! ```rust
//! use packfetch::download::{HashAlgorithm, ValidationSpec};
//!
//! # fn main() -> packfetch::Result<()> {
//! let spec = ValidationSpec::builder()
//!     .size(16)
//!     .hash_hex(
//!         HashAlgorithm::Sha1,
//!         "ce27cb141098feb00714e758646be3e99c185b71",
//!     )?
//!     .use_etag(true)
//!     .build();
//!
//! assert_eq!(spec.expected_size(), Some(16));
//! assert!(spec.has_integrity());
//! # Ok(())
//! # }
//! ```

use super::hash::{hash_file, Digest, HashAlgorithm};
use crate::error::{Error, Result};

use std::collections::BTreeMap;
use std::path::Path;

/// Immutable description of a correct destination file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationSpec {
    expected_size: Option<u64>,
    expected_hashes: BTreeMap<HashAlgorithm, Digest>,
    use_etag: bool,
    use_only_if_newer: bool,
    allow_existence_only: bool,
}

impl ValidationSpec {
    /// Start building a spec.
    pub fn builder() -> ValidationSpecBuilder {
        ValidationSpecBuilder::default()
    }

    /// Expected size in bytes, if known.
    pub fn expected_size(&self) -> Option<u64> {
        self.expected_size
    }

    /// Digests that must all match.
    pub fn expected_hashes(&self) -> &BTreeMap<HashAlgorithm, Digest> {
        &self.expected_hashes
    }

    /// Send `If-None-Match` from the stored ETag.
    pub fn use_etag(&self) -> bool {
        self.use_etag
    }

    /// Send `If-Modified-Since` from the stored Last-Modified date.
    pub fn use_only_if_newer(&self) -> bool {
        self.use_only_if_newer
    }

    /// Whether an existing file with no size and no hash counts as valid.
    pub fn allow_existence_only(&self) -> bool {
        self.allow_existence_only
    }

    /// Whether size or digests are checked, beyond the file being present.
    pub fn has_integrity(&self) -> bool {
        self.expected_size.is_some() || !self.expected_hashes.is_empty()
    }

    /// Whether the sidecar cache metadata is read or written at all.
    pub fn uses_conditional_requests(&self) -> bool {
        self.use_etag || self.use_only_if_newer
    }

    /// Copy of this spec with an extra digest, unless one is already set for
    /// that algorithm.
    pub fn with_discovered_hash(&self, algorithm: HashAlgorithm, digest: Digest) -> Self {
        let mut spec = self.clone();
        spec.expected_hashes.entry(algorithm).or_insert(digest);
        spec
    }

    /// Whether `dest` already satisfies this spec, so no transfer is needed.
    ///
    /// A spec without size and hashes only accepts an existing file when
    /// existence-only mode was opted into with
    /// [`ValidationSpecBuilder::allow_existence_only`].
    pub async fn is_redundant(&self, dest: &Path) -> Result<bool> {
        let metadata = match tokio::fs::metadata(dest).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Ok(false),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(Error::local_io(dest, e)),
        };

        if !self.has_integrity() {
            return Ok(self.allow_existence_only);
        }

        if let Some(size) = self.expected_size {
            if metadata.len() != size {
                return Ok(false);
            }
        }

        if self.expected_hashes.is_empty() {
            return Ok(true);
        }

        let digests = hash_file(dest, self.expected_hashes.keys().copied()).await?;
        Ok(self.mismatch(metadata.len(), &digests).is_none())
    }

    /// Check already computed facts about a file against these expectations.
    ///
    /// Returns a human readable reason on mismatch. Algorithms missing from
    /// `digests` count as mismatches.
    pub fn mismatch(&self, size: u64, digests: &BTreeMap<HashAlgorithm, Digest>) -> Option<String> {
        if let Some(expected) = self.expected_size {
            if expected != size {
                return Some(format!("size mismatch: expected {} bytes, got {}", expected, size));
            }
        }
        for (algorithm, expected) in &self.expected_hashes {
            match digests.get(algorithm) {
                Some(actual) if actual == expected => {}
                Some(actual) => {
                    return Some(format!(
                        "{} mismatch: expected {}, got {}",
                        algorithm, expected, actual
                    ))
                }
                None => return Some(format!("{} digest was not computed", algorithm)),
            }
        }
        None
    }

    /// Verify a file on disk, hashing it from scratch.
    pub async fn verify_file(&self, path: &Path) -> Result<()> {
        let size = tokio::fs::metadata(path)
            .await
            .map_err(|e| Error::local_io(path, e))?
            .len();
        let digests = hash_file(path, self.expected_hashes.keys().copied()).await?;
        match self.mismatch(size, &digests) {
            None => Ok(()),
            Some(reason) => Err(Error::Validation {
                path: path.to_path_buf(),
                reason,
            }),
        }
    }
}

/// Fluent builder for [`ValidationSpec`].
#[derive(Debug, Default)]
pub struct ValidationSpecBuilder {
    spec: ValidationSpec,
}

impl ValidationSpecBuilder {
    /// Require an exact size.
    pub fn size(mut self, size: u64) -> Self {
        self.spec.expected_size = Some(size);
        self
    }

    /// Optionally require an exact size.
    pub fn maybe_size(mut self, size: Option<u64>) -> Self {
        self.spec.expected_size = size;
        self
    }

    /// Require a digest. A later call for the same algorithm replaces the earlier one.
    pub fn hash(mut self, algorithm: HashAlgorithm, digest: Digest) -> Self {
        self.spec.expected_hashes.insert(algorithm, digest);
        self
    }

    /// Require a digest given as hex.
    pub fn hash_hex(self, algorithm: HashAlgorithm, hex_digest: &str) -> Result<Self> {
        let digest = Digest::for_algorithm(algorithm, hex_digest)?;
        Ok(self.hash(algorithm, digest))
    }

    /// Require a SHA-1 digest, the common case for Mojang and mod hosting metadata.
    pub fn sha1(self, hex_digest: &str) -> Result<Self> {
        self.hash_hex(HashAlgorithm::Sha1, hex_digest)
    }

    /// Use the stored ETag for conditional requests.
    pub fn use_etag(mut self, enabled: bool) -> Self {
        self.spec.use_etag = enabled;
        self
    }

    /// Use the stored Last-Modified date for conditional requests.
    pub fn use_only_if_newer(mut self, enabled: bool) -> Self {
        self.spec.use_only_if_newer = enabled;
        self
    }

    /// Accept an existing file by its mere presence when no size or hash is known.
    ///
    /// Meant for large, rarely corrupted assets. Callers that need strict
    /// verification must supply a hash instead.
    pub fn allow_existence_only(mut self, enabled: bool) -> Self {
        self.spec.allow_existence_only = enabled;
        self
    }

    /// Finish the [`ValidationSpec`].
    pub fn build(self) -> ValidationSpec {
        self.spec
    }
}
