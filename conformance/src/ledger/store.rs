//! Fingerprint-guarded blob storage.

use std::path::PathBuf;

use sha1::{Digest, Sha1};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::files::{read_text, write_text};

/// A stored document and the fingerprint it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// UTF-8 content.
    pub content: String,
    /// Content fingerprint to pass back on write.
    pub sha: String,
}

/// Named-document storage with optimistic concurrency.
pub trait BlobStore {
    /// Reads a document. `Ok(None)` means it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails for any reason other than absence.
    fn read(&self, name: &str) -> Result<Option<StoredBlob>>;

    /// Writes a document. `sha` must be the fingerprint returned by the last
    /// read, or `None` when creating.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WriteConflict`] when `sha` is stale, or a backend error.
    fn write(&self, name: &str, content: &str, message: &str, sha: Option<&str>) -> Result<()>;
}

/// Git blob object id of `content`: SHA-1 over `blob <len>\0<content>`.
///
/// This is the `sha` the GitHub contents API reports for a file.
pub fn fingerprint(content: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("blob {}\0", content.len()).as_bytes());
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// A local directory acting as the document branch.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Stores documents under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl BlobStore for DirStore {
    fn read(&self, name: &str) -> Result<Option<StoredBlob>> {
        let path = self.path(name);
        if !path.is_file() {
            debug!(path = %path.display(), "blob not found");
            return Ok(None);
        }
        let content = read_text(&path)?;
        let sha = fingerprint(content.as_bytes());
        Ok(Some(StoredBlob { content, sha }))
    }

    fn write(&self, name: &str, content: &str, message: &str, sha: Option<&str>) -> Result<()> {
        let current = self.read(name)?.map(|blob| blob.sha);
        if current.as_deref() != sha {
            return Err(Error::WriteConflict {
                name: name.to_string(),
                expected: sha.unwrap_or("none").to_string(),
            });
        }
        let path = self.path(name);
        write_text(&path, content)?;
        info!(path = %path.display(), commit = message, "Wrote {name}");
        Ok(())
    }
}
