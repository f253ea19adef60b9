//! CI report mode: one SDK's test run checked against the spec's vectors.

use tracing::{error, info, warn};

use crate::actions::Runner;
use crate::config::ActionInputs;
use crate::error::{Error, Result};
use crate::files::find_files;
use crate::github::CommentThread;
use crate::render::generate_summary;
use crate::report::{build_test_vector_report, TestVectorReport};

/// How the job ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The job succeeds, possibly with warnings.
    Success {
        /// Warnings to surface on the run.
        warnings: Vec<String>,
    },
    /// The job fails with this message.
    Failed(String),
}

impl JobOutcome {
    /// Whether the job succeeds.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Applies the failure policy to a report.
///
/// Failed cases win over missing vectors; each only fails the job when its
/// flag is set.
pub fn job_outcome(
    report: &TestVectorReport,
    fail_on_missing_vectors: bool,
    fail_on_failed_test_cases: bool,
) -> JobOutcome {
    if report.spec_failed_test_cases > 0 && fail_on_failed_test_cases {
        return JobOutcome::Failed("❌ Failed test vectors found".to_string());
    }
    if !report.missing_vectors.is_empty() && fail_on_missing_vectors {
        return JobOutcome::Failed("❌ Missing test vectors found".to_string());
    }
    let mut warnings = Vec::new();
    if report.spec_skipped_test_cases > 0 {
        warnings.push("⚠️ Skipped test vectors found".to_string());
    }
    JobOutcome::Success { warnings }
}

/// Where the summary comment goes.
pub enum CommentTarget<'a> {
    /// The run was not triggered by a pull request.
    NotPullRequest,
    /// A pull request, but no token to comment with.
    MissingToken {
        /// Pull request number.
        number: u64,
    },
    /// The pull request's comment thread.
    Thread(&'a dyn CommentThread),
}

/// Whether a comment was added or refreshed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentAction {
    /// An earlier bot comment was updated.
    Updated {
        /// Comment id.
        id: u64,
    },
    /// A new comment was posted.
    Created {
        /// Comment id.
        id: u64,
    },
}

/// Posts `summary` to `thread`, replacing the bot comment that carries the
/// same first line if there is one.
///
/// # Errors
///
/// Returns the thread's backend error.
pub fn upsert_summary_comment(thread: &dyn CommentThread, summary: &str) -> Result<CommentAction> {
    let header = summary.lines().next().unwrap_or_default();
    let comments = thread.comments()?;
    let existing = comments
        .iter()
        .find(|c| c.is_bot() && c.body.as_deref().is_some_and(|b| b.contains(header)));

    match existing {
        Some(comment) => {
            info!(id = comment.id, "Existing comment found, updating");
            let updated = thread.update(comment.id, summary)?;
            info!(url = %updated.html_url, "Comment updated");
            Ok(CommentAction::Updated { id: comment.id })
        }
        None => {
            info!("No existing comment found, creating new one");
            let created = thread.create(summary)?;
            info!(url = %created.html_url, "Comment created");
            Ok(CommentAction::Created { id: created.id })
        }
    }
}

/// Result of a CI report run.
#[derive(Debug, Clone)]
pub struct CiRun {
    /// Correlated report.
    pub report: TestVectorReport,
    /// Rendered summary HTML.
    pub summary: String,
    /// Job status.
    pub outcome: JobOutcome,
}

/// Builds the report, publishes the summary and decides the job status.
///
/// Step outputs `summary` and `test-vector-report` are always set;
/// `success=true` only when the job succeeds.
///
/// # Errors
///
/// Returns discovery, parsing, runner or comment errors. Policy failures are
/// not errors: they come back as [`JobOutcome::Failed`].
pub fn handle_ci_report(
    inputs: &ActionInputs,
    runner: &Runner,
    comments: CommentTarget<'_>,
) -> Result<CiRun> {
    let report_files = find_files(&inputs.junit_report_paths)?;
    let report = build_test_vector_report(&inputs.spec_path, &report_files, &inputs.correlator())?;
    let summary = generate_summary(&report, inputs.package_name.as_deref());

    let report_json = serde_json::to_string_pretty(&report).map_err(|source| Error::Serialize {
        what: "test vector report",
        source,
    })?;
    runner.set_output("summary", &summary)?;
    runner.set_output("test-vector-report", &report_json)?;
    runner.append_summary(&summary)?;

    let mut outcome = job_outcome(
        &report,
        inputs.fail_on_missing_vectors,
        inputs.fail_on_failed_test_cases,
    );

    if inputs.comment_on_pr {
        match comments {
            CommentTarget::NotPullRequest => info!("Not a PR event, skipping comment"),
            CommentTarget::MissingToken { number } => {
                error!(pull_request = number, "No git token found, skipping comment");
                if outcome.is_success() {
                    outcome = JobOutcome::Failed(
                        "No git token found to add the requested PR comment".to_string(),
                    );
                }
            }
            CommentTarget::Thread(thread) => {
                upsert_summary_comment(thread, &summary)?;
            }
        }
    }

    match &outcome {
        JobOutcome::Success { warnings } => {
            for warning in warnings {
                warn!("{warning}");
            }
            runner.set_output("success", "true")?;
            info!("✅ All test vectors passed");
        }
        JobOutcome::Failed(message) => error!("{message}"),
    }

    Ok(CiRun {
        report,
        summary,
        outcome,
    })
}
