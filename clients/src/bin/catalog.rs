//! `specs-catalog`: Lists the test vectors a spec checkout declares.
//!
//! Prints the catalog as JSON, grouped by feature, in the shape the
//! conformance ledger records for a spec release.
//!
//! **Usage:**
//! ```
//! specs-catalog <spec-path> [--naming feature|category]
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
use clap::{Parser, ValueEnum};
use specs_conformance::{build_catalog, FeatureNaming};

/// How feature directories are named in the output.
#[derive(Clone, Copy, ValueEnum)]
enum Naming {
    /// UpperCamelCase, as recorded in the ledger.
    Feature,
    /// Lowercase directory name, as used by substring correlation.
    Category,
}

impl From<Naming> for FeatureNaming {
    fn from(naming: Naming) -> Self {
        match naming {
            Naming::Feature => FeatureNaming::Feature,
            Naming::Category => FeatureNaming::Category,
        }
    }
}

/// Print the test-vector catalog of a spec checkout.
#[derive(Parser)]
#[command(name = "specs-catalog", about = "List a spec's declared test vectors")]
struct Args {
    /// Spec repository root containing `test-vectors/`.
    spec_path: PathBuf,

    /// Feature naming.
    #[arg(long, value_enum, default_value = "feature")]
    naming: Naming,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let catalog = build_catalog(&args.spec_path, args.naming.into())
        .with_context(|| format!("Failed to build catalog from {}", args.spec_path.display()))?;

    let grouped = catalog.grouped();
    println!("{}", serde_json::to_string_pretty(&grouped)?);
    eprintln!(
        "{} test vectors in {} features",
        catalog.len(),
        grouped.len()
    );
    Ok(())
}
