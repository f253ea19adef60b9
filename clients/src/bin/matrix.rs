//! `specs-matrix`: Renders the Spec Releases Conformance Matrix from a local store.
//!
//! Re-renders every marked conformance table on the page from its ledger
//! document in the store directory, adding the given spec's table if missing.
//!
//! **Usage:**
//! ```
//! specs-matrix --store-dir <path> --spec <name> [--page index.html] [--dry-run]
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use specs_conformance::render::{marked_specs, publish_matrix_page};
use specs_conformance::DirStore;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Render the conformance matrix page from ledger documents in a directory.
#[derive(Parser)]
#[command(
    name = "specs-matrix",
    about = "Render the Spec Releases Conformance Matrix page"
)]
struct Args {
    /// Directory holding `spec-conformance-<spec>.json` documents and the page.
    #[arg(long, default_value = ".")]
    store_dir: PathBuf,

    /// Spec whose table must be on the page.
    #[arg(long)]
    spec: String,

    /// Page file name inside the store directory.
    #[arg(long, default_value = "index.html")]
    page: String,

    /// Print the page instead of writing it.
    #[arg(long)]
    dry_run: bool,

    /// Debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.verbose { "debug" } else { "warn" }));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let store = DirStore::new(&args.store_dir);
    let page = publish_matrix_page(&store, &args.page, &args.spec, None, args.dry_run)
        .with_context(|| format!("Failed to render {}", args.store_dir.join(&args.page).display()))?;

    if args.dry_run {
        println!("{page}");
        return Ok(());
    }
    let specs = marked_specs(&page);
    println!(
        "Wrote {} with {} conformance table(s): {}",
        args.store_dir.join(&args.page).display(),
        specs.len(),
        specs.join(", ")
    );
    Ok(())
}
