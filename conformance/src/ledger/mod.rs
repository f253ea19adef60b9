//! Conformance ledger.
//!
//! One JSON document per spec, named `spec-conformance-<spec>.json`, records
//! every spec release, its declared catalog, and each SDK's latest result
//! against it. Updates are read-modify-write: [`Ledger::read`] returns the
//! document together with its fingerprint and [`Ledger::write`] hands that
//! fingerprint back to the store, which rejects the write if the document
//! changed in between.

pub mod model;
pub mod release;
pub mod status;
pub mod store;

use std::cell::RefCell;

use tracing::{info, warn};

use crate::error::{Error, Result};

pub use model::{
    ConformanceData, FeatureCases, SdkAggregatedStatus, SdkCasesReport, SdkEntry,
    SdkTestResult, SdkTestResultStatus, SpecRelease, SpecReleaseTestVectors,
};
pub use release::{handle_sdk_release, handle_spec_release, SdkRelease, SpecReleaseOutcome};
pub use status::{calculate_sdk_status, extract_sdk_cases_report};
pub use store::{fingerprint, BlobStore, DirStore, StoredBlob};

/// Owner assumed when a repository is given without one.
pub const DEFAULT_OWNER: &str = "TBD54566975";

/// A ledger document read at a known fingerprint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerSnapshot {
    /// Parsed document.
    pub data: ConformanceData,
    /// Fingerprint of the stored bytes. `None` when the document does not exist yet.
    pub sha: Option<String>,
}

/// The conformance document of one spec, bound to a store.
pub struct Ledger<'a> {
    store: &'a dyn BlobStore,
    spec_name: String,
    skip_write: bool,
    pending: RefCell<Option<LedgerSnapshot>>,
}

impl<'a> Ledger<'a> {
    /// Binds the ledger of `spec_name` to `store`.
    pub fn new(store: &'a dyn BlobStore, spec_name: impl Into<String>) -> Self {
        Self {
            store,
            spec_name: spec_name.into(),
            skip_write: false,
            pending: RefCell::new(None),
        }
    }

    /// When set, writes are logged and kept in memory instead of stored.
    pub fn skip_write(mut self, skip: bool) -> Self {
        self.skip_write = skip;
        self
    }

    /// Spec name.
    pub fn spec_name(&self) -> &str {
        &self.spec_name
    }

    /// Name of the stored document.
    pub fn file_name(&self) -> String {
        file_name(&self.spec_name)
    }

    /// Reads the document. A missing document reads as empty with no fingerprint.
    ///
    /// # Errors
    ///
    /// Returns a store error, or [`Error::LedgerJson`] if the content does not parse.
    pub fn read(&self) -> Result<LedgerSnapshot> {
        let file = self.file_name();
        let Some(blob) = self.store.read(&file)? else {
            warn!(file = %file, "Conformance JSON file not found, initializing a new one");
            return Ok(LedgerSnapshot::default());
        };
        let data = serde_json::from_str(&blob.content)
            .map_err(|source| Error::LedgerJson { file, source })?;
        Ok(LedgerSnapshot {
            data,
            sha: Some(blob.sha),
        })
    }

    /// Writes `data` guarded by `sha`, with a commit message naming the
    /// releasing package and tag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WriteConflict`] if the document changed since `sha` was read.
    pub fn write(
        &self,
        data: &ConformanceData,
        sha: Option<&str>,
        package: &str,
        tag: &str,
    ) -> Result<()> {
        let file = self.file_name();
        let content = to_json(data)?;
        if self.skip_write {
            info!(file = %file, "Test mode, skipping write to {file}");
            self.pending.replace(Some(LedgerSnapshot {
                data: data.clone(),
                sha: Some(fingerprint(content.as_bytes())),
            }));
            return Ok(());
        }
        let message = format!("[ci] Update {file}: {package}@{tag}");
        self.store.write(&file, &content, &message, sha)
    }

    /// The last document a skipped write would have stored.
    pub fn pending(&self) -> Option<LedgerSnapshot> {
        self.pending.borrow().clone()
    }
}

/// Name of the document that stores `spec_name`'s ledger.
pub fn file_name(spec_name: &str) -> String {
    format!("spec-conformance-{spec_name}.json")
}

/// Serializes a document with two-space indentation.
///
/// # Errors
///
/// Returns [`Error::Serialize`]; not expected for well-formed data.
pub fn to_json(data: &ConformanceData) -> Result<String> {
    serde_json::to_string_pretty(data).map_err(|source| Error::Serialize {
        what: "conformance JSON",
        source,
    })
}

fn owner_and_repo(repo: &str) -> (&str, &str) {
    match repo.split_once('/') {
        Some((owner, name)) => (owner, name.split('/').next().unwrap_or(name)),
        None => (DEFAULT_OWNER, repo),
    }
}

/// Release page of `tag` in `repo` (`owner/name`, or a bare name under the default owner).
pub fn release_link(repo: &str, tag: &str) -> String {
    let (owner, name) = owner_and_repo(repo);
    format!("https://github.com/{owner}/{name}/releases/tag/{tag}")
}

/// Fixture tree of a spec at `tag`.
pub fn src_link(repo: &str, tag: &str) -> String {
    let (owner, name) = owner_and_repo(repo);
    format!("https://github.com/{owner}/{name}/tree/{tag}/test-vectors")
}
