//! Test-vector report: per-run counts and the four vector partitions.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::correlate::{correlate, CorrelationStats, Correlator, VectorMatcher};
use crate::error::Result;
use crate::junit::{parse_junit_suites, CaseStatus};
use crate::vectors::{build_catalog, TestVector, VectorCatalog};

/// Classification of one vector within a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorStatus {
    /// No case exercised the vector.
    Missing,
    /// At least one case failed or errored.
    Failed,
    /// At least one case was skipped and none failed.
    Skipped,
    /// Every case passed.
    Success,
}

impl VectorStatus {
    /// Classifies a vector by its attached cases.
    pub fn of(vector: &TestVector) -> Self {
        if vector.test_cases.is_empty() {
            return Self::Missing;
        }
        let statuses = || vector.test_cases.iter().map(|c| c.status());
        if statuses().any(|s| s == CaseStatus::Failed) {
            Self::Failed
        } else if statuses().any(|s| s == CaseStatus::Skipped) {
            Self::Skipped
        } else {
            Self::Success
        }
    }
}

/// Snapshot of one CI run against a spec's vectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestVectorReport {
    /// JUnit files read.
    pub total_junit_files: usize,
    /// Vectors the spec declares.
    pub total_test_vectors: usize,
    /// JUnit cases read, matched or not.
    pub total_junit_test_cases: usize,
    /// Cases attached to a vector.
    pub spec_test_cases: usize,
    /// Attached cases that failed or errored.
    pub spec_failed_test_cases: usize,
    /// Attached cases that passed.
    pub spec_passed_test_cases: usize,
    /// Attached cases that were skipped.
    pub spec_skipped_test_cases: usize,
    /// Vectors with no case.
    pub missing_vectors: Vec<TestVector>,
    /// Vectors with a failed case.
    pub failed_vectors: Vec<TestVector>,
    /// Vectors with a skipped case and no failure.
    pub skipped_vectors: Vec<TestVector>,
    /// Vectors whose cases all passed.
    pub success_vectors: Vec<TestVector>,
}

impl TestVectorReport {
    /// Returns true if every declared vector passed.
    pub fn all_passed(&self) -> bool {
        self.success_vectors.len() == self.total_test_vectors
    }

    /// Iterates every vector with its partition.
    pub fn partitions(&self) -> impl Iterator<Item = (VectorStatus, &TestVector)> {
        self.missing_vectors
            .iter()
            .map(|v| (VectorStatus::Missing, v))
            .chain(self.failed_vectors.iter().map(|v| (VectorStatus::Failed, v)))
            .chain(self.skipped_vectors.iter().map(|v| (VectorStatus::Skipped, v)))
            .chain(self.success_vectors.iter().map(|v| (VectorStatus::Success, v)))
    }
}

/// Partitions a correlated catalog and counts its cases.
///
/// Partition lists keep catalog order.
pub fn aggregate(
    catalog: VectorCatalog,
    total_junit_files: usize,
    stats: &CorrelationStats,
) -> TestVectorReport {
    let mut report = TestVectorReport {
        total_junit_files,
        total_test_vectors: catalog.len(),
        total_junit_test_cases: stats.total_junit_test_cases,
        spec_test_cases: stats.total_spec_test_cases,
        ..TestVectorReport::default()
    };

    for vector in catalog.into_vectors() {
        for case in &vector.test_cases {
            match case.status() {
                CaseStatus::Passed => report.spec_passed_test_cases += 1,
                CaseStatus::Failed => report.spec_failed_test_cases += 1,
                CaseStatus::Skipped => report.spec_skipped_test_cases += 1,
            }
        }
        let bucket = match VectorStatus::of(&vector) {
            VectorStatus::Missing => &mut report.missing_vectors,
            VectorStatus::Failed => &mut report.failed_vectors,
            VectorStatus::Skipped => &mut report.skipped_vectors,
            VectorStatus::Success => &mut report.success_vectors,
        };
        bucket.push(vector);
    }
    report
}

/// Builds the catalog, parses the reports, correlates and aggregates.
///
/// # Errors
///
/// Propagates catalog and JUnit errors; see [`build_catalog`] and
/// [`parse_junit_suites`].
pub fn build_test_vector_report(
    spec_path: &Path,
    report_files: &[PathBuf],
    correlator: &Correlator,
) -> Result<TestVectorReport> {
    let mut catalog = build_catalog(spec_path, correlator.naming())?;
    let suites = parse_junit_suites(report_files)?;
    let stats = correlate(&mut catalog, &suites, correlator);
    let report = aggregate(catalog, report_files.len(), &stats);
    info!(
        total_test_vectors = report.total_test_vectors,
        missing = report.missing_vectors.len(),
        failed = report.failed_vectors.len(),
        skipped = report.skipped_vectors.len(),
        success = report.success_vectors.len(),
        "Test vector report computed"
    );
    Ok(report)
}
