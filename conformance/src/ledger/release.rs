//! Spec and SDK release handlers.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::correlate::RegexPairMatcher;
use crate::error::{Error, Result};
use crate::junit::parse_junit_suites;
use crate::vectors::{build_catalog, FeatureNaming};

use super::model::{ConformanceData, SdkEntry, SpecRelease, SpecReleaseTestVectors};
use super::status::{calculate_sdk_status, extract_sdk_cases_report};
use super::{release_link, src_link, Ledger};

/// What a spec release did to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecReleaseOutcome {
    /// A new release was prepended.
    Created,
    /// The release existed; its catalog was replaced and its SDK entries kept.
    Replaced {
        /// SDK packages whose recorded status differs under the new catalog.
        stale_sdks: Vec<String>,
    },
}

/// Records `spec_tag`'s catalog in `data`.
///
/// A known version keeps its SDK entries; only its catalog is replaced. SDK
/// entries whose status would change under the new catalog are reported as
/// stale but left as recorded.
pub fn apply_spec_release(
    data: &mut ConformanceData,
    spec_tag: &str,
    release_link: String,
    test_vectors: SpecReleaseTestVectors,
) -> SpecReleaseOutcome {
    let Some(current) = data.release_mut(spec_tag) else {
        data.spec_releases.insert(
            0,
            SpecRelease {
                version: spec_tag.to_string(),
                release_link,
                test_vectors,
                sdks: Default::default(),
            },
        );
        return SpecReleaseOutcome::Created;
    };

    warn!(
        tag = spec_tag,
        "Spec version {spec_tag} already exists in the conformance JSON, overriding spec test vectors only"
    );
    current.test_vectors = test_vectors;

    let stale_sdks: Vec<String> = current
        .sdks
        .iter()
        .filter(|(_, sdk)| calculate_sdk_status(&sdk.cases_report, &current.test_vectors) != sdk.status)
        .map(|(name, _)| name.clone())
        .collect();
    for name in &stale_sdks {
        warn!(
            tag = spec_tag,
            sdk = %name,
            "SDK {name} status was computed against the previous {spec_tag} test vectors and is now stale"
        );
    }
    SpecReleaseOutcome::Replaced { stale_sdks }
}

/// Builds the catalog at `spec_path` and records it as release `spec_tag`.
///
/// # Errors
///
/// Returns [`Error::EmptyCatalog`] when no vectors are found, catalog errors,
/// and ledger read/write errors (including [`Error::WriteConflict`]).
pub fn handle_spec_release(
    ledger: &Ledger<'_>,
    spec_path: &Path,
    release_repo: &str,
    spec_tag: &str,
) -> Result<SpecReleaseOutcome> {
    let catalog = build_catalog(spec_path, FeatureNaming::Feature)?;
    if catalog.is_empty() {
        return Err(Error::EmptyCatalog {
            spec_path: spec_path.to_path_buf(),
            spec_name: ledger.spec_name().to_string(),
            spec_tag: spec_tag.to_string(),
        });
    }
    let test_vectors = SpecReleaseTestVectors {
        src_link: src_link(release_repo, spec_tag),
        cases: catalog.grouped(),
    };

    let mut snapshot = ledger.read()?;
    let outcome = apply_spec_release(
        &mut snapshot.data,
        spec_tag,
        release_link(release_repo, spec_tag),
        test_vectors,
    );
    ledger.write(
        &snapshot.data,
        snapshot.sha.as_deref(),
        ledger.spec_name(),
        spec_tag,
    )?;
    info!(spec = ledger.spec_name(), tag = spec_tag, vectors = catalog.len(), "Spec release recorded");
    Ok(outcome)
}

/// Identity of an SDK release.
#[derive(Debug, Clone, Copy)]
pub struct SdkRelease<'a> {
    /// SDK repository, `owner/name` or a bare name.
    pub release_repo: &'a str,
    /// Package name, the key in the release's `sdks` map.
    pub package_name: &'a str,
    /// SDK tag.
    pub release_tag: &'a str,
    /// Spec tag the SDK was tested against.
    pub spec_tag: &'a str,
}

/// Stores `entry` under the SDK's package in release `spec_tag`.
///
/// # Errors
///
/// Returns [`Error::SpecReleaseNotFound`] if the spec version was never released.
pub fn apply_sdk_release(
    data: &mut ConformanceData,
    file: &str,
    spec_tag: &str,
    package_name: &str,
    entry: SdkEntry,
) -> Result<()> {
    let release = data
        .release_mut(spec_tag)
        .ok_or_else(|| Error::SpecReleaseNotFound {
            spec_tag: spec_tag.to_string(),
            file: file.to_string(),
        })?;
    release.sdks.insert(package_name.to_string(), entry);
    Ok(())
}

/// Computes the SDK's results from its JUnit reports and records them.
///
/// # Errors
///
/// Returns [`Error::SpecReleaseNotFound`], JUnit errors, and ledger
/// read/write errors (including [`Error::WriteConflict`]).
pub fn handle_sdk_release(
    ledger: &Ledger<'_>,
    release: &SdkRelease<'_>,
    report_files: &[PathBuf],
    matcher: &RegexPairMatcher,
) -> Result<SdkEntry> {
    let mut snapshot = ledger.read()?;
    let declared = snapshot
        .data
        .release(release.spec_tag)
        .map(|r| r.test_vectors.clone())
        .ok_or_else(|| Error::SpecReleaseNotFound {
            spec_tag: release.spec_tag.to_string(),
            file: ledger.file_name(),
        })?;

    let suites = parse_junit_suites(report_files)?;
    let cases_report = extract_sdk_cases_report(&suites, matcher);
    let status = calculate_sdk_status(&cases_report, &declared);
    info!(
        package = release.package_name,
        tag = release.release_tag,
        spec_tag = release.spec_tag,
        status = status.as_str(),
        features = cases_report.len(),
        "Extracted SDK test cases"
    );

    let entry = SdkEntry {
        version: release.release_tag.to_string(),
        release_link: release_link(release.release_repo, release.release_tag),
        cases_report,
        status,
    };
    apply_sdk_release(
        &mut snapshot.data,
        &ledger.file_name(),
        release.spec_tag,
        release.package_name,
        entry.clone(),
    )?;
    ledger.write(
        &snapshot.data,
        snapshot.sha.as_deref(),
        release.package_name,
        release.release_tag,
    )?;
    Ok(entry)
}
