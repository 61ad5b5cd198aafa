//! Path-addressable object storage.
//!
//! Everything above this module talks to storage through [`ObjectStore`] using
//! `s3://bucket/key` URIs. The S3 backend is used in production; the in-memory
//! backend backs tests.

mod memory;
mod s3;

use std::fmt;
use tracing::debug;

use crate::error::{QcError, Result};

pub use memory::MemoryStore;
pub use s3::{S3Settings, S3Store};

/// Trait for object storage backends.
pub trait ObjectStore: Send + Sync {
    /// List the immediate children ("directories") under a prefix.
    /// Returned URIs carry no trailing slash.
    fn list_children(&self, prefix: &str) -> Result<Vec<String>>;

    /// Read a whole object.
    fn read(&self, uri: &str) -> Result<Vec<u8>>;

    /// Create or replace an object.
    fn write(&self, uri: &str, bytes: &[u8]) -> Result<()>;

    /// Read an object as UTF-8 text.
    fn read_to_string(&self, uri: &str) -> Result<String> {
        let bytes = self.read(uri)?;
        String::from_utf8(bytes)
            .map_err(|e| QcError::Transport(format!("{} is not valid UTF-8: {}", uri, e)))
    }

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}

/// Copy one object between two (possibly different) stores.
pub fn copy_object(
    source: &dyn ObjectStore,
    destination: &dyn ObjectStore,
    source_uri: &str,
    destination_uri: &str,
) -> Result<u64> {
    let bytes = source.read(source_uri)?;
    destination.write(destination_uri, &bytes)?;
    debug!(
        "Copied {} bytes from {} ({}) to {} ({})",
        bytes.len(),
        source_uri,
        source.name(),
        destination_uri,
        destination.name()
    );
    Ok(bytes.len() as u64)
}

/// A parsed `s3://bucket/key` address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Uri {
    pub bucket: String,
    pub key: String,
}

impl S3Uri {
    pub fn parse(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("s3://")
            .ok_or_else(|| QcError::InvalidUri(uri.to_string()))?;

        let (bucket, key) = match rest.split_once('/') {
            Some((bucket, key)) => (bucket, key),
            None => (rest, ""),
        };

        if bucket.is_empty() {
            return Err(QcError::InvalidUri(uri.to_string()));
        }

        Ok(Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    /// The key with a guaranteed trailing slash, as used for prefix listings.
    pub fn dir_prefix(&self) -> String {
        if self.key.is_empty() || self.key.ends_with('/') {
            self.key.clone()
        } else {
            format!("{}/", self.key)
        }
    }
}

impl fmt::Display for S3Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Last path segment of a URI or path, ignoring a trailing slash.
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}
