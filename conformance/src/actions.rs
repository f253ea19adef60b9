//! GitHub Actions runner protocol: step outputs, job summary, workflow commands.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::ledger::fingerprint;

/// Files the runner reads outputs and the job summary from.
#[derive(Debug, Clone, Default)]
pub struct Runner {
    output_file: Option<PathBuf>,
    summary_file: Option<PathBuf>,
}

impl Runner {
    /// Uses `GITHUB_OUTPUT` and `GITHUB_STEP_SUMMARY`. Outside a runner both
    /// are unset and writes become no-ops.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var_os(name).filter(|v| !v.is_empty()).map(PathBuf::from);
        Self::new(var("GITHUB_OUTPUT"), var("GITHUB_STEP_SUMMARY"))
    }

    /// Uses explicit files.
    pub fn new(output_file: Option<PathBuf>, summary_file: Option<PathBuf>) -> Self {
        Self {
            output_file,
            summary_file,
        }
    }

    /// Sets step output `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the output file cannot be appended to.
    pub fn set_output(&self, name: &str, value: &str) -> Result<()> {
        let Some(file) = &self.output_file else {
            debug!(name, "no GITHUB_OUTPUT, output dropped");
            return Ok(());
        };
        append(file, &output_entry(name, value))
    }

    /// Appends HTML to the job summary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the summary file cannot be appended to.
    pub fn append_summary(&self, html: &str) -> Result<()> {
        let Some(file) = &self.summary_file else {
            debug!("no GITHUB_STEP_SUMMARY, summary dropped");
            return Ok(());
        };
        append(file, html)
    }
}

/// `name<<DELIM\nvalue\nDELIM\n`, with a delimiter that cannot occur in `value`.
fn output_entry(name: &str, value: &str) -> String {
    let delimiter = format!("ghadelimiter_{}", fingerprint(value.as_bytes()));
    format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
}

fn append(path: &Path, content: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::io(path, e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| Error::io(path, e))
}

/// A workflow command line such as `::error::message`.
///
/// Newlines and `%` in the message are escaped so it stays on one line.
pub fn workflow_command(command: &str, message: &str) -> String {
    let escaped = message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A");
    format!("::{command}::{escaped}")
}
