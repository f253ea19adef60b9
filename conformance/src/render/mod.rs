//! HTML renderers for the job summary and the conformance matrix page.

pub mod matrix;
pub mod summary;

pub use matrix::{
    conformance_table, marked_specs, publish_matrix_page, splice_table, MATRIX_COMMIT_MESSAGE,
};
pub use summary::{generate_summary, render_summary, SUMMARY_HEADER};

/// Escapes HTML special characters in a string.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

/// A table cell for [`SummaryBuilder::table`].
#[derive(Debug, Clone)]
pub struct Cell {
    /// Raw HTML content.
    pub data: String,
    /// Render as `<th>`.
    pub header: bool,
}

impl Cell {
    /// A header cell.
    pub fn header(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            header: true,
        }
    }

    /// A data cell.
    pub fn data(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            header: false,
        }
    }
}

/// Accumulates job-summary HTML the way the Actions toolkit summary buffer does.
#[derive(Debug, Default)]
pub struct SummaryBuilder {
    buffer: String,
}

impl SummaryBuilder {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// `<hN>` heading followed by a newline. Levels outside 1..=6 render as `<h1>`.
    pub fn heading(&mut self, text: &str, level: u8) -> &mut Self {
        let level = if (1..=6).contains(&level) { level } else { 1 };
        self.buffer
            .push_str(&format!("<h{level}>{text}</h{level}>\n"));
        self
    }

    /// Raw HTML, no newline.
    pub fn raw(&mut self, html: &str) -> &mut Self {
        self.buffer.push_str(html);
        self
    }

    /// A `<table>` of rows followed by a newline.
    pub fn table(&mut self, rows: &[Vec<Cell>]) -> &mut Self {
        self.buffer.push_str("<table>");
        for row in rows {
            self.buffer.push_str("<tr>");
            for cell in row {
                let tag = if cell.header { "th" } else { "td" };
                self.buffer
                    .push_str(&format!("<{tag}>{}</{tag}>", cell.data));
            }
            self.buffer.push_str("</tr>");
        }
        self.buffer.push_str("</table>\n");
        self
    }

    /// `<hr>` followed by a newline.
    pub fn separator(&mut self) -> &mut Self {
        self.buffer.push_str("<hr>\n");
        self
    }

    /// The accumulated HTML.
    pub fn stringify(&self) -> &str {
        &self.buffer
    }
}
