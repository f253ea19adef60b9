//! Conformance matrix: one HTML table per spec, spliced into a published page.
//!
//! Each table sits between `<!-- <spec> CONFORMANCE TABLE: BEGIN -->` and
//! `<!-- <spec> CONFORMANCE TABLE: END -->` markers, so a page can host the
//! matrices of several specs and each is re-rendered from its own ledger.

use regex::Regex;
use tracing::{info, warn};

use crate::error::Result;
use crate::ledger::{BlobStore, ConformanceData, Ledger, LedgerSnapshot};

use super::escape_html;

/// Commit message used when the page is written.
pub const MATRIX_COMMIT_MESSAGE: &str = "Update Spec Releases Conformance Matrix";

/// Page used when the store has none yet.
const EMPTY_PAGE: &str = "<!DOCTYPE html>
<html lang=\"en\">
<head>
<meta charset=\"utf-8\">
<title>Spec Releases Conformance Matrix</title>
</head>
<body>
<main>
<h1>Spec Releases Conformance Matrix</h1>
</main>
</body>
</html>
";

fn begin_marker(spec_name: &str) -> String {
    format!("<!-- {spec_name} CONFORMANCE TABLE: BEGIN -->")
}

fn end_marker(spec_name: &str) -> String {
    format!("<!-- {spec_name} CONFORMANCE TABLE: END -->")
}

/// Renders the marked table for `spec_name`.
///
/// Rows are spec releases in document order; columns are SDK packages, sorted.
/// `sha` is the fingerprint of the ledger document the table was rendered from.
pub fn conformance_table(spec_name: &str, data: &ConformanceData, sha: Option<&str>) -> String {
    let sdks = data.sdk_names();
    let mut html = String::new();

    html.push_str(&begin_marker(spec_name));
    html.push('\n');
    html.push_str(&format!(
        "<table role=\"grid\" aria-label=\"{} Conformance Table\"",
        escape_html(spec_name)
    ));
    if let Some(sha) = sha {
        html.push_str(&format!(" data-conformance-sha=\"{}\"", escape_html(sha)));
    }
    html.push_str(">\n  <thead>\n    <tr>\n      <th scope=\"col\">Specification</th>\n");
    for sdk in &sdks {
        html.push_str(&format!("      <th scope=\"col\">{}</th>\n", escape_html(sdk)));
    }
    html.push_str("    </tr>\n  </thead>\n  <tbody>\n");

    for release in &data.spec_releases {
        html.push_str("    <tr>\n");
        html.push_str(&format!(
            "      <td><a href=\"{}\">{}</a><br/><a href=\"{}\">(tests)</a></td>\n",
            escape_html(&release.release_link),
            escape_html(&release.version),
            escape_html(&release.test_vectors.src_link),
        ));
        for sdk in &sdks {
            match release.sdks.get(*sdk) {
                Some(entry) => html.push_str(&format!(
                    "      <td><a href=\"{}\">{}</a> <span title=\"{}\">{}</span></td>\n",
                    escape_html(&entry.release_link),
                    escape_html(&entry.version),
                    entry.status.as_str(),
                    entry.status.icon(),
                )),
                None => html.push_str("      <td>-</td>\n"),
            }
        }
        html.push_str("    </tr>\n");
    }

    html.push_str("  </tbody>\n</table>\n");
    html.push_str(&end_marker(spec_name));
    html
}

/// Names of every spec with a marked table in `page`, in page order.
pub fn marked_specs(page: &str) -> Vec<String> {
    let Ok(marker) = Regex::new(r"<!-- (\S+) CONFORMANCE TABLE: BEGIN -->") else {
        return Vec::new();
    };
    let mut specs: Vec<String> = Vec::new();
    for caps in marker.captures_iter(page) {
        let name = caps[1].to_string();
        if !specs.contains(&name) {
            specs.push(name);
        }
    }
    specs
}

/// Replaces `spec_name`'s marked block in `page` with `block`.
///
/// Without markers the block is inserted before `</main>` or `</body>`, or
/// appended.
pub fn splice_table(page: &str, spec_name: &str, block: &str) -> String {
    let begin = begin_marker(spec_name);
    let end = end_marker(spec_name);
    if let Some(start) = page.find(&begin) {
        if let Some(offset) = page[start..].find(&end) {
            let stop = start + offset + end.len();
            return format!("{}{}{}", &page[..start], block, &page[stop..]);
        }
    }
    for closing in ["</main>", "</body>"] {
        if let Some(at) = page.rfind(closing) {
            return format!("{}{}\n{}", &page[..at], block, &page[at..]);
        }
    }
    format!("{page}{block}\n")
}

/// Re-renders every marked table on the page from its ledger and writes the
/// page back. The current spec's table is added if the page lacks it, and is
/// rendered from `current` instead of the store when given.
///
/// Returns the rendered page.
///
/// # Errors
///
/// Returns store or ledger errors, including [`crate::error::Error::WriteConflict`] when the
/// page changed since it was read.
pub fn publish_matrix_page(
    store: &dyn BlobStore,
    page_name: &str,
    current_spec: &str,
    current: Option<&LedgerSnapshot>,
    skip_write: bool,
) -> Result<String> {
    let (mut page, sha) = match store.read(page_name)? {
        Some(blob) => (blob.content, Some(blob.sha)),
        None => {
            warn!(page = page_name, "Conformance matrix page not found, creating it");
            (EMPTY_PAGE.to_string(), None)
        }
    };

    let mut specs = marked_specs(&page);
    if !specs.iter().any(|s| s == current_spec) {
        specs.push(current_spec.to_string());
    }
    for spec in &specs {
        let snapshot = match current {
            Some(current) if spec == current_spec => current.clone(),
            _ => Ledger::new(store, spec.as_str()).read()?,
        };
        let block = conformance_table(spec, &snapshot.data, snapshot.sha.as_deref());
        page = splice_table(&page, spec, &block);
        info!(page = page_name, spec = %spec, releases = snapshot.data.spec_releases.len(), "Rendered conformance table");
    }

    if skip_write {
        info!(page = page_name, "Test mode, skipping write to {page_name}");
        return Ok(page);
    }
    store.write(page_name, &page, MATRIX_COMMIT_MESSAGE, sha.as_deref())?;
    Ok(page)
}
