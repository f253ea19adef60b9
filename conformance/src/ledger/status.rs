//! Aggregated SDK status and per-case result extraction.

use crate::correlate::{extract_vector_cases, RegexPairMatcher};
use crate::junit::{CaseStatus, TestCase, TestSuite};

use super::model::{
    SdkAggregatedStatus, SdkCasesReport, SdkTestResult, SdkTestResultStatus,
    SpecReleaseTestVectors,
};

/// Computes an SDK's verdict against a spec release's declared catalog.
///
/// An absent feature or case degrades the verdict to `missing` and scanning
/// continues. The first declared case present with a non-passed status makes
/// the verdict `failed` immediately. Results for undeclared features or cases
/// are ignored.
pub fn calculate_sdk_status(
    cases_report: &SdkCasesReport,
    test_vectors: &SpecReleaseTestVectors,
) -> SdkAggregatedStatus {
    let mut status = SdkAggregatedStatus::Passed;
    for (feature, declared) in &test_vectors.cases {
        let Some(sdk_cases) = cases_report.get(feature) else {
            status = SdkAggregatedStatus::Missing;
            continue;
        };
        for name in declared {
            match sdk_cases.get(name) {
                None => status = SdkAggregatedStatus::Missing,
                Some(result) if result.status != SdkTestResultStatus::Passed => {
                    return SdkAggregatedStatus::Failed;
                }
                Some(_) => {}
            }
        }
    }
    status
}

impl From<&TestCase> for SdkTestResult {
    fn from(case: &TestCase) -> Self {
        let status = match case.status() {
            CaseStatus::Passed => SdkTestResultStatus::Passed,
            CaseStatus::Failed => SdkTestResultStatus::Failed,
            CaseStatus::Skipped => SdkTestResultStatus::Skipped,
        };
        let entries = if case.error.is_empty() {
            &case.failure
        } else {
            &case.error
        };
        let details = entries
            .iter()
            .map(|d| {
                format!(
                    "{}  {}",
                    d.inner.as_deref().unwrap_or_default(),
                    d.message.as_deref().unwrap_or_default()
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            status,
            details: if details.is_empty() { None } else { Some(details) },
        }
    }
}

/// Builds an SDK cases report straight from JUnit suites.
///
/// When the same `(feature, vector)` is reported more than once, the last
/// result wins.
pub fn extract_sdk_cases_report(suites: &[TestSuite], matcher: &RegexPairMatcher) -> SdkCasesReport {
    let mut report = SdkCasesReport::new();
    for extracted in extract_vector_cases(suites, matcher) {
        report
            .entry(extracted.feature)
            .or_default()
            .insert(extracted.name, SdkTestResult::from(&extracted.test_case));
    }
    report
}
