//! Persisted conformance document.
//!
//! Maps serialize in key order so that re-serializing an unchanged document
//! yields identical bytes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Declared vector names per feature, in catalog order.
pub type FeatureCases = BTreeMap<String, Vec<String>>;

/// Per-feature, per-case results reported by an SDK.
pub type SdkCasesReport = BTreeMap<String, BTreeMap<String, SdkTestResult>>;

/// The whole document stored for one spec.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConformanceData {
    /// Releases, newest first.
    #[serde(default)]
    pub spec_releases: Vec<SpecRelease>,
}

impl ConformanceData {
    /// The release with this exact version.
    pub fn release(&self, version: &str) -> Option<&SpecRelease> {
        self.spec_releases.iter().find(|r| r.version == version)
    }

    /// Mutable access to the release with this exact version.
    pub fn release_mut(&mut self, version: &str) -> Option<&mut SpecRelease> {
        self.spec_releases.iter_mut().find(|r| r.version == version)
    }

    /// Every SDK package that appears in any release, sorted.
    pub fn sdk_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .spec_releases
            .iter()
            .flat_map(|r| r.sdks.keys().map(String::as_str))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// One tagged spec release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecRelease {
    /// Spec tag.
    pub version: String,
    /// Link to the release page.
    pub release_link: String,
    /// Declared catalog for this version.
    pub test_vectors: SpecReleaseTestVectors,
    /// Latest result per SDK package.
    #[serde(default)]
    pub sdks: BTreeMap<String, SdkEntry>,
}

/// Declared catalog of a spec release.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecReleaseTestVectors {
    /// Link to the fixture tree at this tag.
    pub src_link: String,
    /// Vector names per feature.
    pub cases: FeatureCases,
}

/// An SDK's latest result against one spec release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkEntry {
    /// SDK tag.
    pub version: String,
    /// Link to the SDK release page.
    pub release_link: String,
    /// Raw per-case results.
    pub cases_report: SdkCasesReport,
    /// Aggregated verdict.
    pub status: SdkAggregatedStatus,
}

/// Result of one SDK case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkTestResult {
    /// Case status.
    pub status: SdkTestResultStatus,
    /// Failure or error text, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl SdkTestResult {
    /// A passing result without details.
    pub fn passed() -> Self {
        Self {
            status: SdkTestResultStatus::Passed,
            details: None,
        }
    }
}

/// Status of one SDK case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdkTestResultStatus {
    /// The case passed.
    Passed,
    /// The case failed or errored.
    Failed,
    /// The case was skipped.
    Skipped,
    /// The reporter gave no usable status.
    #[serde(other)]
    Unknown,
}

/// Aggregated verdict of an SDK against a spec release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdkAggregatedStatus {
    /// Every declared case passed.
    Passed,
    /// A declared case did not pass.
    Failed,
    /// A declared feature or case has no result.
    Missing,
}

impl SdkAggregatedStatus {
    /// Icon used in the conformance matrix.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Passed => "✅",
            Self::Failed => "❌",
            Self::Missing => "🚧",
        }
    }

    /// Lowercase name, as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Missing => "missing",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_shape() {
        let json = r#"{
          "specReleases": [
            {
              "version": "v1.0.0",
              "releaseLink": "https://github.com/TBD54566975/web5-spec/releases/tag/v1.0.0",
              "testVectors": {
                "srcLink": "https://github.com/TBD54566975/web5-spec/tree/v1.0.0/test-vectors",
                "cases": { "DidJwk": ["resolve"] }
              },
              "sdks": {
                "web5-kt": {
                  "version": "v2.0.0",
                  "releaseLink": "https://github.com/TBD54566975/web5-kt/releases/tag/v2.0.0",
                  "casesReport": { "DidJwk": { "resolve": { "status": "weird" } } },
                  "status": "missing"
                }
              }
            }
          ]
        }"#;
        let data: ConformanceData = serde_json::from_str(json).unwrap();
        let release = data.release("v1.0.0").unwrap();
        let sdk = &release.sdks["web5-kt"];
        assert_eq!(sdk.status, SdkAggregatedStatus::Missing);
        assert_eq!(sdk.cases_report["DidJwk"]["resolve"].status, SdkTestResultStatus::Unknown);
        assert!(data.release("v0.9.0").is_none());
    }

    #[test]
    fn sdks_default_to_empty() {
        let json = r#"{"specReleases":[{"version":"v1","releaseLink":"l","testVectors":{"srcLink":"s","cases":{}}}]}"#;
        let data: ConformanceData = serde_json::from_str(json).unwrap();
        assert!(data.spec_releases[0].sdks.is_empty());
        assert!(data.sdk_names().is_empty());
    }

    #[test]
    fn details_are_omitted_when_absent() {
        let json = serde_json::to_string(&SdkTestResult::passed()).unwrap();
        assert_eq!(json, r#"{"status":"passed"}"#);
    }
}
