//! Spec test-vector conformance engine.
//!
//! A spec repository declares its test vectors as JSON fixtures under
//! `test-vectors/`; each SDK runs them and emits JUnit XML. This crate
//! correlates the two and keeps a per-spec conformance ledger across SDK
//! releases.
//!
//! # Components
//!
//! | Module | Role |
//! |--------|------|
//! | [`vectors`] | Vector catalog built from a spec checkout |
//! | [`junit`] | JUnit XML normalized into suites and cases |
//! | [`correlate`] | Cases attached to vectors by substring or regex pair |
//! | [`report`] | Vectors partitioned into missing, failed, skipped, success |
//! | [`ledger`] | Fingerprint-guarded conformance document per spec |
//! | [`render`] | Job summary and conformance matrix HTML |
//! | [`ci`] | CI report mode: outputs, PR comment, job status |
//! | [`github`] | gh-pages blob store and PR comment thread |
//!
//! # Entry Point
//!
//! ```no_run
//! use specs_conformance::{run, ActionInputs, GitHubContext, Runner};
//!
//! # fn main() -> specs_conformance::Result<()> {
//! let inputs = ActionInputs::from_env()?;
//! let outcome = run(&inputs, &Runner::from_env(), &GitHubContext::from_env())?;
//! assert!(outcome.failure().is_none());
//! # Ok(())
//! # }
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod actions;
pub mod ci;
pub mod config;
pub mod correlate;
pub mod error;
pub mod files;
pub mod github;
pub mod junit;
pub mod ledger;
pub mod render;
pub mod report;
pub mod tests;
pub mod vectors;

use tracing::info;

use ledger::{handle_sdk_release, handle_spec_release};

pub use actions::{workflow_command, Runner};
pub use ci::{handle_ci_report, job_outcome, CiRun, CommentTarget, JobOutcome};
pub use config::{ActionInputs, ReleaseMode};
pub use correlate::{Correlator, RegexPairMatcher, SubstringMatcher, VectorMatcher};
pub use error::{Error, Result};
pub use github::{GhPagesStore, GitHubClient, GitHubContext, PullRequestThread};
pub use ledger::{
    BlobStore, ConformanceData, DirStore, Ledger, SdkAggregatedStatus, SdkEntry, SdkRelease,
    SpecReleaseOutcome,
};
pub use report::{build_test_vector_report, TestVectorReport};
pub use vectors::{build_catalog, FeatureNaming, TestVector, VectorCatalog};

/// What a run produced.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// CI report mode.
    Report(CiRun),
    /// A spec release was recorded.
    SpecRelease(SpecReleaseOutcome),
    /// An SDK release was recorded.
    SdkRelease(SdkEntry),
}

impl RunOutcome {
    /// The job-failure message, if the run's policy fails the job.
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Report(CiRun {
                outcome: JobOutcome::Failed(message),
                ..
            }) => Some(message.as_str()),
            _ => None,
        }
    }
}

/// Runs the mode selected by `inputs.release_mode`.
///
/// Release modes write the ledger to `conformance-store-dir` when set, else to
/// the `gh-pages` branch of the workflow's repository, and republish the
/// conformance matrix page when `html-report-write` is set. Under a skipped
/// write the page shows the unwritten ledger.
///
/// # Errors
///
/// Returns the first fatal error of the selected mode.
pub fn run(inputs: &ActionInputs, runner: &Runner, context: &GitHubContext) -> Result<RunOutcome> {
    match inputs.release_mode {
        ReleaseMode::None => run_ci_report(inputs, runner, context).map(RunOutcome::Report),
        ReleaseMode::Spec => {
            let store = open_store(inputs, context)?;
            let ledger = Ledger::new(store.as_ref(), inputs.spec_name.as_str())
                .skip_write(inputs.skip_write);
            let outcome = handle_spec_release(
                &ledger,
                &inputs.spec_path,
                &inputs.release_repo,
                &inputs.spec_tag,
            )?;
            publish_matrix(inputs, store.as_ref(), &ledger)?;
            Ok(RunOutcome::SpecRelease(outcome))
        }
        ReleaseMode::Sdk => {
            let matcher = inputs.regex_pair().ok_or_else(|| {
                Error::Config(vec!["Input required and not supplied: vector-regex".to_string()])
            })?;
            let report_files = files::find_files(&inputs.junit_report_paths)?;
            let store = open_store(inputs, context)?;
            let ledger = Ledger::new(store.as_ref(), inputs.spec_name.as_str())
                .skip_write(inputs.skip_write);
            let release = SdkRelease {
                release_repo: &inputs.release_repo,
                package_name: &inputs.release_package_name,
                release_tag: &inputs.release_tag,
                spec_tag: &inputs.spec_tag,
            };
            let entry = handle_sdk_release(&ledger, &release, &report_files, &matcher)?;
            publish_matrix(inputs, store.as_ref(), &ledger)?;
            Ok(RunOutcome::SdkRelease(entry))
        }
    }
}

fn run_ci_report(inputs: &ActionInputs, runner: &Runner, context: &GitHubContext) -> Result<CiRun> {
    let thread;
    let target = match (context.pull_request(), inputs.git_token.as_deref()) {
        (None, _) => CommentTarget::NotPullRequest,
        (Some(number), None) => CommentTarget::MissingToken { number },
        (Some(number), Some(token)) => {
            info!(pull_request = number, "Adding summary report comment to PR #{number}");
            thread = PullRequestThread::new(GitHubClient::for_context(context, token), number);
            CommentTarget::Thread(&thread)
        }
    };
    handle_ci_report(inputs, runner, target)
}

fn open_store(inputs: &ActionInputs, context: &GitHubContext) -> Result<Box<dyn BlobStore>> {
    if let Some(dir) = &inputs.conformance_store_dir {
        info!(dir = %dir.display(), "Using local conformance store");
        return Ok(Box::new(DirStore::new(dir)));
    }
    let mut problems = Vec::new();
    if inputs.git_token.is_none() {
        problems.push("Input required and not supplied: git-token".to_string());
    }
    if context.repository.is_empty() {
        problems.push("GITHUB_REPOSITORY is not set".to_string());
    }
    match inputs.git_token.as_deref() {
        Some(token) if problems.is_empty() => Ok(Box::new(GhPagesStore::new(
            GitHubClient::for_context(context, token),
        ))),
        _ => Err(Error::Config(problems)),
    }
}

fn publish_matrix(inputs: &ActionInputs, store: &dyn BlobStore, ledger: &Ledger<'_>) -> Result<()> {
    if !inputs.html_report_write {
        return Ok(());
    }
    render::publish_matrix_page(
        store,
        &inputs.html_report_file,
        &inputs.spec_name,
        ledger.pending().as_ref(),
        inputs.skip_write,
    )?;
    Ok(())
}
