//! Error taxonomy for the conformance engine.
//!
//! Fatal conditions surface as [`Error`]. Non-fatal conditions (dangling JUnit
//! results, missing or failed vectors) are never errors: they are logged and
//! carried as report data.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All fatal errors raised by the engine.
#[derive(Debug, Error)]
pub enum Error {
    /// A file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A test-vector fixture is not valid JSON.
    #[error("Failed to parse test vector file {path}: {source}")]
    VectorJson {
        /// Fixture path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// No vector name can be derived from a fixture path.
    #[error("Test vector file name for {path} is missing")]
    MalformedVectorPath {
        /// Fixture path.
        path: PathBuf,
    },

    /// Two fixtures resolve to the same `(feature, name)` identity.
    #[error("Duplicate test vector {feature}/{name}: {first} and {second}")]
    DuplicateVector {
        /// Feature identifier.
        feature: String,
        /// Vector name.
        name: String,
        /// First fixture with this identity.
        first: PathBuf,
        /// Second fixture with this identity.
        second: PathBuf,
    },

    /// A JUnit report is not well-formed XML.
    #[error("Failed to parse JUnit XML file {path}: {message}")]
    JunitParse {
        /// Report path (or a label for in-memory reports).
        path: String,
        /// Parser message.
        message: String,
    },

    /// A JUnit report parsed but holds neither test suites nor test cases.
    #[error("Failed to get testcases from JUnit XML file {path}: root element <{root}> has no testsuite or testcase")]
    MalformedJunit {
        /// Report path (or a label for in-memory reports).
        path: String,
        /// Name of the root element found.
        root: String,
    },

    /// A discovery glob pattern is invalid.
    #[error("Invalid glob pattern '{pattern}': {message}")]
    InvalidPattern {
        /// Offending pattern.
        pattern: String,
        /// Parser message.
        message: String,
    },

    /// A correlation regex is invalid.
    #[error("Invalid regex for {input} '{pattern}': {source}")]
    InvalidRegex {
        /// Name of the input that carried the regex.
        input: String,
        /// Offending pattern.
        pattern: String,
        /// Underlying error.
        #[source]
        source: regex::Error,
    },

    /// One or more action inputs are missing or invalid.
    #[error("Invalid action inputs:\n  {}", .0.join("\n  "))]
    Config(Vec<String>),

    /// A spec release produced no test vectors.
    #[error("No test vectors found under {spec_path} for spec {spec_name}@{spec_tag}")]
    EmptyCatalog {
        /// Spec root that was scanned.
        spec_path: PathBuf,
        /// Spec name.
        spec_name: String,
        /// Spec tag being released.
        spec_tag: String,
    },

    /// An SDK release references a spec version absent from the ledger.
    #[error("Spec release {spec_tag} not found in conformance JSON {file} yet. Are you sure you released the spec or have the right spec version?")]
    SpecReleaseNotFound {
        /// Requested spec tag.
        spec_tag: String,
        /// Ledger document name.
        file: String,
    },

    /// The stored ledger document is not valid conformance JSON.
    #[error("Failed to parse conformance JSON {file}: {source}")]
    LedgerJson {
        /// Ledger document name.
        file: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A fingerprint-guarded write lost a race with another writer.
    #[error("Write conflict on {name}: stored content changed since it was read (expected sha {expected}); re-read and retry")]
    WriteConflict {
        /// Blob name.
        name: String,
        /// Fingerprint the writer held, or `none`.
        expected: String,
    },

    /// The GitHub API returned an unexpected response.
    #[error("GitHub API {method} {url} failed with status {status}: {body}")]
    GitHub {
        /// HTTP method.
        method: &'static str,
        /// Request URL.
        url: String,
        /// HTTP status (0 when the request never completed).
        status: u16,
        /// Response body or transport error text.
        body: String,
    },

    /// A value could not be serialized.
    #[error("Failed to serialize {what}: {source}")]
    Serialize {
        /// What was being serialized.
        what: &'static str,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if this error is a lost optimistic-concurrency race.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::WriteConflict { .. })
    }
}
