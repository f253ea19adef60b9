//! Test-vector catalog builder.
//!
//! Scans a spec tree for JSON fixtures under any `test-vectors/` directory and
//! derives a `(feature, name)` identity for each one from its path:
//!
//! ```text
//! test-vectors/crypto_ed25519/sign.json            -> (CryptoEd25519, sign)
//! test-vectors/protocol/vectors/parse-balance.json -> (Protocol, parse_balance)
//! ```
//!
//! Two fixture conventions are accepted. Both require a non-empty
//! `description`; one adds `input` + `output`, the other a `vectors` list.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::junit::TestCase;

/// Directory name that marks a fixture subtree.
pub const TEST_VECTORS_DIR: &str = "test-vectors";

/// Intermediate folder skipped when deriving the feature.
const VECTORS_SUBDIR: &str = "vectors";

/// How the feature folder name is rendered into an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureNaming {
    /// Lowercase snake case: `did-jwk` -> `did_jwk`.
    Category,
    /// UpperCamelCase: `did_jwk` -> `DidJwk`.
    Feature,
}

impl FeatureNaming {
    /// Renders a raw folder name under this convention.
    pub fn apply(self, raw: &str) -> String {
        match self {
            Self::Category => raw.replace('-', "_").to_lowercase(),
            Self::Feature => upper_camel_case(raw),
        }
    }
}

/// Converts `snake_case` or `kebab-case` into `UpperCamelCase`.
///
/// Only the first letter of each word changes.
pub fn upper_camel_case(raw: &str) -> String {
    raw.split(['_', '-'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// A declared test vector and the JUnit cases correlated with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestVector {
    /// Feature identifier, rendered per [`FeatureNaming`].
    pub feature: String,
    /// Vector name: file stem, hyphens replaced, lowercased.
    pub name: String,
    /// Source fixture.
    #[serde(serialize_with = "serialize_path")]
    pub file: PathBuf,
    /// Correlated cases, in correlation order.
    pub test_cases: Vec<TestCase>,
}

fn serialize_path<S: Serializer>(path: &Path, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&path.to_string_lossy())
}

impl TestVector {
    /// Creates a vector with no cases attached.
    pub fn new(feature: impl Into<String>, name: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            feature: feature.into(),
            name: name.into(),
            file: file.into(),
            test_cases: Vec::new(),
        }
    }
}

/// The vectors a spec declares, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct VectorCatalog {
    vectors: Vec<TestVector>,
    index: HashMap<(String, String), usize>,
}

impl VectorCatalog {
    /// Builds a catalog from already-derived vectors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateVector`] if two vectors share an identity.
    pub fn from_vectors(vectors: impl IntoIterator<Item = TestVector>) -> Result<Self> {
        let mut catalog = Self::default();
        for vector in vectors {
            catalog.insert(vector)?;
        }
        Ok(catalog)
    }

    fn insert(&mut self, vector: TestVector) -> Result<()> {
        let key = (vector.feature.clone(), vector.name.clone());
        if let Some(&existing) = self.index.get(&key) {
            return Err(Error::DuplicateVector {
                feature: key.0,
                name: key.1,
                first: self.vectors[existing].file.clone(),
                second: vector.file,
            });
        }
        self.index.insert(key, self.vectors.len());
        self.vectors.push(vector);
        Ok(())
    }

    /// Number of declared vectors.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// True if no vectors were declared.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Vectors in discovery order.
    pub fn vectors(&self) -> &[TestVector] {
        &self.vectors
    }

    /// Mutable access for the correlator.
    pub fn vectors_mut(&mut self) -> &mut [TestVector] {
        &mut self.vectors
    }

    /// Position of the vector with this exact identity.
    pub fn position(&self, feature: &str, name: &str) -> Option<usize> {
        self.index
            .get(&(feature.to_string(), name.to_string()))
            .copied()
    }

    /// Vector names grouped by feature, each group in discovery order.
    pub fn grouped(&self) -> BTreeMap<String, Vec<String>> {
        let mut cases: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for vector in &self.vectors {
            cases
                .entry(vector.feature.clone())
                .or_default()
                .push(vector.name.clone());
        }
        cases
    }

    /// Consumes the catalog, yielding its vectors.
    pub fn into_vectors(self) -> Vec<TestVector> {
        self.vectors
    }
}

/// Scans `spec_path` and builds the catalog of valid vectors.
///
/// # Errors
///
/// Returns [`Error::VectorJson`] for unparsable fixtures,
/// [`Error::MalformedVectorPath`] when a name cannot be derived, and
/// [`Error::DuplicateVector`] on identity clashes.
pub fn build_catalog(spec_path: &Path, naming: FeatureNaming) -> Result<VectorCatalog> {
    let files = discover_vector_files(spec_path);
    info!(
        spec_path = %spec_path.display(),
        candidates = files.len(),
        "Scanning test vector files"
    );

    let mut catalog = VectorCatalog::default();
    for file in files {
        if !is_test_vector_file(&file)? {
            debug!(file = %file.display(), "skipping file without test vector shape");
            continue;
        }
        let vector = vector_from_path(&file, naming)?;
        debug!(feature = %vector.feature, name = %vector.name, file = %file.display(), "Test vector");
        catalog.insert(vector)?;
    }
    Ok(catalog)
}

/// Lists `*.json` files that sit below a `test-vectors` directory.
pub fn discover_vector_files(spec_path: &Path) -> Vec<PathBuf> {
    WalkDir::new(spec_path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_candidate(spec_path, p))
        .collect()
}

fn is_candidate(root: &Path, path: &Path) -> bool {
    let file_name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return false,
    };
    if !file_name.ends_with(".json")
        || file_name.ends_with(".schema.json")
        || file_name == "package.json"
        || file_name == "package-lock.json"
    {
        return false;
    }
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .parent()
        .map(|dir| dir.components().any(|c| c.as_os_str() == TEST_VECTORS_DIR))
        .unwrap_or(false)
}

/// Checks the fixture shape.
///
/// # Errors
///
/// Returns [`Error::Io`] or [`Error::VectorJson`] if the file cannot be read as JSON.
pub fn is_test_vector_file(path: &Path) -> Result<bool> {
    let content = crate::files::read_text(path)?;
    let json: Value = serde_json::from_str(&content).map_err(|source| Error::VectorJson {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(has_test_vector_shape(&json))
}

/// A non-empty `description`, plus `input` and `output` or a `vectors` field.
pub fn has_test_vector_shape(json: &Value) -> bool {
    let present = |key: &str| json.get(key).map(|v| !v.is_null()).unwrap_or(false);

    let described = json
        .get("description")
        .and_then(Value::as_str)
        .map(|d| !d.is_empty())
        .unwrap_or(false);
    if !described {
        return false;
    }

    let io_format = present("input") && present("output");
    let vectors_format = present("vectors");
    io_format || vectors_format
}

/// Derives a vector identity from its fixture path.
///
/// # Errors
///
/// Returns [`Error::MalformedVectorPath`] if the file name yields no name.
pub fn vector_from_path(path: &Path, naming: FeatureNaming) -> Result<TestVector> {
    let malformed = || Error::MalformedVectorPath {
        path: path.to_path_buf(),
    };

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(malformed)?;
    let stem = file_name.split('.').next().unwrap_or_default();
    if stem.is_empty() {
        return Err(malformed());
    }
    let name = stem.replace('-', "_").to_lowercase();

    let mut folders = path
        .parent()
        .into_iter()
        .flat_map(|p| p.iter().rev())
        .filter_map(|c| c.to_str());
    let mut folder = folders.next().unwrap_or_default();
    if folder == VECTORS_SUBDIR {
        folder = folders.next().unwrap_or_default();
    }

    Ok(TestVector::new(naming.apply(folder), name, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(root: &Path, rel: &str, body: &Value) {
        crate::files::write_text(&root.join(rel), &body.to_string()).unwrap();
    }

    #[test]
    fn naming_conventions() {
        assert_eq!(FeatureNaming::Category.apply("Did-Jwk"), "did_jwk");
        assert_eq!(FeatureNaming::Feature.apply("crypto_ed25519"), "CryptoEd25519");
        assert_eq!(FeatureNaming::Feature.apply("presentation-exchange"), "PresentationExchange");
        assert_eq!(FeatureNaming::Feature.apply("protocol"), "Protocol");
    }

    #[test]
    fn vectors_folder_is_skipped() {
        let path = Path::new("/w/tbdex/hosted/test-vectors/protocol/vectors/parse-rfq-omit-private-data.json");
        let category = vector_from_path(path, FeatureNaming::Category).unwrap();
        assert_eq!(category.feature, "protocol");
        assert_eq!(category.name, "parse_rfq_omit_private_data");

        let feature = vector_from_path(path, FeatureNaming::Feature).unwrap();
        assert_eq!(feature.feature, "Protocol");
    }

    #[test]
    fn name_stops_at_first_dot() {
        let path = Path::new("test-vectors/did_dht/resolve.v2.json");
        let vector = vector_from_path(path, FeatureNaming::Feature).unwrap();
        assert_eq!(vector.name, "resolve");
        assert_eq!(vector.feature, "DidDht");
    }

    #[test]
    fn hidden_file_has_no_name() {
        let err = vector_from_path(Path::new("test-vectors/x/.json"), FeatureNaming::Category)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedVectorPath { .. }));
    }

    #[test]
    fn shape_check_accepts_both_conventions() {
        assert!(has_test_vector_shape(&json!({"description": "d", "input": {}, "output": 1})));
        assert!(has_test_vector_shape(&json!({"description": "d", "vectors": []})));
        assert!(!has_test_vector_shape(&json!({"description": "", "vectors": []})));
        assert!(!has_test_vector_shape(&json!({"description": "d", "input": {}})));
        assert!(!has_test_vector_shape(&json!({"description": "d", "input": {}, "output": null})));
        assert!(!has_test_vector_shape(&json!({"input": {}, "output": {}})));
    }

    #[test]
    fn catalog_keeps_discovery_order_and_groups() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let valid = json!({"description": "ok", "vectors": [{"input": 1}]});
        write(root, "test-vectors/did_jwk/resolve.json", &valid);
        write(root, "test-vectors/crypto_ed25519/verify.json", &valid);
        write(root, "test-vectors/crypto_ed25519/sign.json", &valid);
        write(root, "test-vectors/crypto_ed25519/notes.json", &json!({"title": "no shape"}));
        write(root, "test-vectors/vectors.schema.json", &valid);
        write(root, "other/did_web/resolve.json", &valid);

        let catalog = build_catalog(root, FeatureNaming::Feature).unwrap();
        let ids: Vec<(&str, &str)> = catalog
            .vectors()
            .iter()
            .map(|v| (v.feature.as_str(), v.name.as_str()))
            .collect();
        assert_eq!(
            ids,
            [("CryptoEd25519", "sign"), ("CryptoEd25519", "verify"), ("DidJwk", "resolve")]
        );

        let grouped = catalog.grouped();
        assert_eq!(grouped["CryptoEd25519"], ["sign", "verify"]);
        assert_eq!(grouped["DidJwk"], ["resolve"]);
        assert_eq!(catalog.position("DidJwk", "resolve"), Some(2));
        assert_eq!(catalog.position("DidJwk", "create"), None);
    }

    #[test]
    fn unparsable_fixture_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        crate::files::write_text(&dir.path().join("test-vectors/x/broken.json"), "{").unwrap();
        let err = build_catalog(dir.path(), FeatureNaming::Category).unwrap_err();
        assert!(matches!(err, Error::VectorJson { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn duplicate_identity_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let valid = json!({"description": "ok", "input": 1, "output": 2});
        write(dir.path(), "test-vectors/protocol/parse-rfq.json", &valid);
        write(dir.path(), "test-vectors/protocol/vectors/parse-rfq.json", &valid);

        let err = build_catalog(dir.path(), FeatureNaming::Category).unwrap_err();
        assert!(matches!(err, Error::DuplicateVector { ref name, .. } if name == "parse_rfq"));
    }
}
