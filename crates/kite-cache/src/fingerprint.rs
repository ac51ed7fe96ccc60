use std::fmt;
use std::io::Read;
use std::path::Path;
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;

/// A stable SHA-256 fingerprint stored as a lowercase hex string.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes.as_ref());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut hasher = Sha256::new();
        let mut buf = [0_u8; 64 * 1024];
        loop {
            let read = reader.read(&mut buf)?;
            if read == 0 {
                break;
            }
            hasher.update(&buf[..read]);
        }
        Ok(Self(hex::encode(hasher.finalize())))
    }

    /// Fingerprint of a file's contents, streamed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Fingerprint of a file's path, size and mtime. Cheap, but only as good
    /// as the filesystem's timestamps.
    pub fn from_file_metadata(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let meta = std::fs::metadata(path)?;
        let modified_nanos: u128 = meta
            .modified()
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map(|dur| dur.as_nanos())
            .unwrap_or(0);

        let mut builder = FingerprintBuilder::new();
        builder.push_str(&path.to_string_lossy());
        builder.push_u64(meta.len());
        builder.push_bytes(&modified_nanos.to_le_bytes());
        Ok(builder.finish())
    }

    /// Identify a project directory.
    ///
    /// `KITE_PROJECT_ID` wins when set and non-empty, so caches can be shared
    /// across checkouts; otherwise the canonical root path is hashed.
    pub fn for_project_root(project_root: impl AsRef<Path>) -> Result<Self> {
        if let Some(id) = std::env::var_os("KITE_PROJECT_ID") {
            let id = id.to_string_lossy();
            if !id.trim().is_empty() {
                return Ok(Self::from_bytes(id.as_bytes()));
            }
        }

        let canonical = kite_core::canonicalize_if_possible(project_root.as_ref())?;
        Ok(Self::from_bytes(canonical.to_string_lossy().as_bytes()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Incremental fingerprint over a sequence of length-delimited parts.
///
/// Parts are length-prefixed so `("ab", "c")` and `("a", "bc")` differ.
#[derive(Clone)]
pub struct FingerprintBuilder {
    hasher: Sha256,
}

impl FingerprintBuilder {
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.hasher.update((bytes.len() as u64).to_le_bytes());
        self.hasher.update(bytes);
        self
    }

    pub fn push_str(&mut self, value: &str) -> &mut Self {
        self.push_bytes(value.as_bytes())
    }

    pub fn push_u64(&mut self, value: u64) -> &mut Self {
        self.hasher.update(value.to_le_bytes());
        self
    }

    pub fn finish(self) -> Fingerprint {
        Fingerprint(hex::encode(self.hasher.finalize()))
    }
}

impl Default for FingerprintBuilder {
    fn default() -> Self {
        Self::new()
    }
}
