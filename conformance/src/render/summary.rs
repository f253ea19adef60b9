//! Job summary and PR comment body for a [`TestVectorReport`].

use chrono::{SecondsFormat, Utc};
use tracing::info;

use crate::files::working_dir_name;
use crate::junit::{FailureDetail, TestCase};
use crate::report::TestVectorReport;
use crate::vectors::TestVector;

use super::{escape_html, Cell, SummaryBuilder};

/// Title of every summary. The rendered first line identifies prior PR comments.
pub const SUMMARY_HEADER: &str = "TBD Spec Test Vectors Report";

/// Renders the summary for the current working directory, timestamped now.
pub fn generate_summary(report: &TestVectorReport, package_name: Option<&str>) -> String {
    let generated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let summary = render_summary(report, package_name, &working_dir_name(), &generated_at);
    info!(bytes = summary.len(), "Generated report summary");
    summary
}

/// Renders the summary. File paths are shown from `parent_dir` on.
pub fn render_summary(
    report: &TestVectorReport,
    package_name: Option<&str>,
    parent_dir: &str,
    generated_at: &str,
) -> String {
    let mut summary = SummaryBuilder::new();
    let header = match package_name.filter(|p| !p.is_empty()) {
        Some(package) => format!("{SUMMARY_HEADER} ({})", escape_html(package)),
        None => SUMMARY_HEADER.to_string(),
    };
    summary.heading(&header, 2);

    add_overall_stats(&mut summary, report);
    add_failed_vectors(&mut summary, &report.failed_vectors, parent_dir);
    add_missing_vectors(&mut summary, &report.missing_vectors);
    add_skipped_vectors(&mut summary, &report.skipped_vectors, parent_dir);

    summary
        .separator()
        .raw(&format!("<em>Automatically generated at: {generated_at}</em>"));
    summary.stringify().to_string()
}

fn add_overall_stats(summary: &mut SummaryBuilder, report: &TestVectorReport) {
    summary.table(&[
        vec![
            Cell::header("Total Test Vectors"),
            Cell::header("Total Test Cases"),
            Cell::header("✅ Passed"),
            Cell::header("❌ Failed"),
            Cell::header("⚠️ Skipped"),
        ],
        vec![
            Cell::data(report.total_test_vectors.to_string()),
            Cell::data(report.spec_test_cases.to_string()),
            Cell::data(report.spec_passed_test_cases.to_string()),
            Cell::data(report.spec_failed_test_cases.to_string()),
            Cell::data(report.spec_skipped_test_cases.to_string()),
        ],
    ]);

    let success = report.success_vectors.len();
    let total = report.total_test_vectors;
    if success == total {
        summary.raw("✅ All test vectors passed");
    } else {
        summary.raw(&format!(
            "ℹ️ {success} out of {total} test vectors passed successfully."
        ));
    }
}

fn add_failed_vectors(summary: &mut SummaryBuilder, vectors: &[TestVector], parent_dir: &str) {
    if vectors.is_empty() {
        return;
    }
    summary
        .heading(&format!("❌ Failed Vectors ({})", vectors.len()), 3)
        .raw("These are test vectors with test cases that failed.");
    for vector in vectors {
        summary
            .heading(&vector_title(vector), 4)
            .raw(&format!("File: {}\n\n", relative_path(vector, parent_dir)));

        let mut rows = vec![vec![Cell::header("Test Case"), Cell::header("Failure Message")]];
        rows.extend(
            vector
                .test_cases
                .iter()
                .filter(|c| c.problems().next().is_some())
                .map(|c| vec![Cell::data(case_name(c)), Cell::data(failure_rows(c))]),
        );
        summary.table(&rows);
    }
}

fn add_missing_vectors(summary: &mut SummaryBuilder, vectors: &[TestVector]) {
    if vectors.is_empty() {
        return;
    }
    summary
        .heading(&format!("❌ Missing Vectors ({})", vectors.len()), 3)
        .raw("These are test vectors without any test cases.");
    let mut rows = vec![vec![Cell::header("Feature"), Cell::header("Name")]];
    rows.extend(vectors.iter().map(|v| {
        vec![
            Cell::data(escape_html(&v.feature)),
            Cell::data(escape_html(&v.name)),
        ]
    }));
    summary.table(&rows);
}

fn add_skipped_vectors(summary: &mut SummaryBuilder, vectors: &[TestVector], parent_dir: &str) {
    if vectors.is_empty() {
        return;
    }
    summary
        .heading(&format!("⚠️ Skipped Vectors ({})", vectors.len()), 3)
        .raw("These are test vectors with test cases that are set to skip.");
    for vector in vectors {
        summary
            .heading(&vector_title(vector), 3)
            .raw(&format!(
                "<code>File: {}</code>\n\n",
                relative_path(vector, parent_dir)
            ));
        let mut rows = vec![vec![Cell::header("Test Case")]];
        rows.extend(
            vector
                .test_cases
                .iter()
                .filter(|c| c.skipped.is_some())
                .map(|c| vec![Cell::data(case_name(c))]),
        );
        summary.table(&rows);
    }
}

fn vector_title(vector: &TestVector) -> String {
    escape_html(&format!("{}: {}", vector.feature, vector.name))
}

fn case_name(case: &TestCase) -> String {
    if case.name.is_empty() {
        "Unnamed test".to_string()
    } else {
        escape_html(&case.name)
    }
}

/// The part of the vector's path after the last `<parent_dir>/` segment.
fn relative_path(vector: &TestVector, parent_dir: &str) -> String {
    let path = vector.file.to_string_lossy();
    let marker = format!("{parent_dir}/");
    let relative = match path.rfind(&marker) {
        Some(at) if !parent_dir.is_empty() => &path[at + marker.len()..],
        _ => &path[..],
    };
    escape_html(relative)
}

fn failure_rows(case: &TestCase) -> String {
    let details: Vec<&FailureDetail> = case.problems().collect();
    if details.is_empty() {
        return "Unknown failure".to_string();
    }
    details
        .iter()
        .map(|d| {
            let inner = d
                .inner
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(escape_html)
                .unwrap_or_else(|| "Unknown error".to_string());
            format!(
                "<b>{}</b><br/><pre>{inner}\n</pre>",
                escape_html(d.message.as_deref().unwrap_or_default())
            )
        })
        .collect::<Vec<_>>()
        .join("<br>\n")
}
