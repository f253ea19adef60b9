//! `specs-report`: GitHub Action entry point.
//!
//! Reads the action inputs from `INPUT_*` variables and runs the selected
//! release mode: the CI test-vector report, a spec release, or an SDK release.
//!
//! **Usage:**
//! ```
//! specs-report [--verbose] [--dry-run] [--store-dir <path>]
//! ```
//!
//! Exits non-zero on a fatal error or when the job-status policy fails the run.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use specs_conformance::{
    run, workflow_command, ActionInputs, GitHubContext, JobOutcome, RunOutcome, Runner,
    SpecReleaseOutcome,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Correlate JUnit results with spec test vectors and maintain the conformance ledger.
#[derive(Parser)]
#[command(
    name = "specs-report",
    about = "Spec test-vector report and conformance ledger for GitHub Actions"
)]
struct Args {
    /// Debug logging.
    #[arg(short, long)]
    verbose: bool,

    /// Compute everything but skip ledger and page writes.
    #[arg(long)]
    dry_run: bool,

    /// Keep the conformance ledger in this directory instead of the gh-pages branch.
    #[arg(long)]
    store_dir: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    match execute(args) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(err) => {
            println!("{}", workflow_command("error", &format!("{err:#}")));
            process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Returns whether the job succeeded.
fn execute(args: Args) -> Result<bool> {
    let mut inputs = ActionInputs::from_env().context("Failed to read action inputs")?;
    if args.dry_run {
        inputs.skip_write = true;
    }
    if let Some(dir) = args.store_dir {
        inputs.conformance_store_dir = Some(dir);
    }
    info!(mode = ?inputs.release_mode, "Starting specs report");

    let outcome = run(&inputs, &Runner::from_env(), &GitHubContext::from_env())?;
    match &outcome {
        RunOutcome::Report(ci) => {
            let report = &ci.report;
            println!(
                "Test vectors: {} total, {} passed, {} failed, {} skipped, {} missing",
                report.total_test_vectors,
                report.success_vectors.len(),
                report.failed_vectors.len(),
                report.skipped_vectors.len(),
                report.missing_vectors.len()
            );
            println!(
                "Test cases: {} matched of {} read from {} JUnit file(s)",
                report.spec_test_cases, report.total_junit_test_cases, report.total_junit_files
            );
            match &ci.outcome {
                JobOutcome::Success { warnings } => {
                    for warning in warnings {
                        println!("{}", workflow_command("warning", warning));
                    }
                }
                JobOutcome::Failed(message) => {
                    println!("{}", workflow_command("error", message));
                }
            }
        }
        RunOutcome::SpecRelease(SpecReleaseOutcome::Created) => {
            println!("Recorded spec release {}@{}", inputs.spec_name, inputs.spec_tag);
        }
        RunOutcome::SpecRelease(SpecReleaseOutcome::Replaced { stale_sdks }) => {
            println!(
                "Replaced test vectors of spec release {}@{}",
                inputs.spec_name, inputs.spec_tag
            );
            for sdk in stale_sdks {
                println!(
                    "{}",
                    workflow_command(
                        "warning",
                        &format!("{sdk} status is stale against the new {} test vectors", inputs.spec_tag)
                    )
                );
            }
        }
        RunOutcome::SdkRelease(entry) => {
            println!(
                "Recorded {}@{} against {}@{}: {} {}",
                inputs.release_package_name,
                entry.version,
                inputs.spec_name,
                inputs.spec_tag,
                entry.status.icon(),
                entry.status.as_str()
            );
        }
    }
    Ok(outcome.failure().is_none())
}
