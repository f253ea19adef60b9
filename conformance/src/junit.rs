//! JUnit XML normalizer.
//!
//! Parses one or more JUnit reports into [`TestSuite`]s. Two root shapes are
//! accepted: a `<testsuites>` collection (nested suites are flattened
//! depth-first) and a bare `<testsuite>`.

use std::borrow::Cow;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Outcome of a single test case, derived from its markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    /// No failure, error or skip marker.
    Passed,
    /// At least one `<failure>` or `<error>`.
    Failed,
    /// A `<skipped>` marker and no failure.
    Skipped,
}

/// One `<failure>` or `<error>` entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailureDetail {
    /// The `message` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The `type` attribute.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Element text, usually a stack trace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner: Option<String>,
}

/// A `<skipped>` marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skipped {
    /// The `message` attribute, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A single `<testcase>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Case name.
    #[serde(default)]
    pub name: String,
    /// Class name.
    #[serde(default)]
    pub classname: String,
    /// Duration in seconds.
    #[serde(default)]
    pub time: f64,
    /// Failure entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failure: Vec<FailureDetail>,
    /// Error entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error: Vec<FailureDetail>,
    /// Skip marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<Skipped>,
    /// Captured stdout blocks.
    #[serde(default, rename = "system-out", skip_serializing_if = "Vec::is_empty")]
    pub system_out: Vec<String>,
    /// Captured stderr blocks.
    #[serde(default, rename = "system-err", skip_serializing_if = "Vec::is_empty")]
    pub system_err: Vec<String>,
}

impl TestCase {
    /// Creates a passing case with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Derives the case status. Failures and errors win over skips.
    pub fn status(&self) -> CaseStatus {
        if !self.failure.is_empty() || !self.error.is_empty() {
            CaseStatus::Failed
        } else if self.skipped.is_some() {
            CaseStatus::Skipped
        } else {
            CaseStatus::Passed
        }
    }

    /// Error entries followed by failure entries.
    pub fn problems(&self) -> impl Iterator<Item = &FailureDetail> {
        self.error.iter().chain(self.failure.iter())
    }
}

/// A `<testsuite>` and its direct test cases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestSuite {
    /// Suite name.
    #[serde(default)]
    pub name: String,
    /// Duration in seconds, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    /// Test cases in document order.
    #[serde(default, rename = "testcase")]
    pub test_cases: Vec<TestCase>,
}

/// Parses every report file into suites, in file order.
///
/// # Errors
///
/// Returns [`Error::Io`] if a file cannot be read, [`Error::JunitParse`] if it
/// is not well-formed XML, and [`Error::MalformedJunit`] if it holds no suites
/// or cases.
pub fn parse_junit_suites<P: AsRef<Path>>(report_files: &[P]) -> Result<Vec<TestSuite>> {
    let labels: Vec<String> = report_files
        .iter()
        .map(|p| p.as_ref().display().to_string())
        .collect();
    info!(files = %labels.join(", "), "Parsing JUnit XML files");

    let mut suites = Vec::new();
    for file in report_files {
        let path = file.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        debug!(file = %path.display(), bytes = content.len(), "Parsing JUnit XML file");
        suites.extend(parse_junit_str(&content, &path.display().to_string())?);
    }
    Ok(suites)
}

/// Parses every report file and flattens all cases, in file and suite order.
///
/// # Errors
///
/// Same as [`parse_junit_suites`].
pub fn parse_junit_cases<P: AsRef<Path>>(report_files: &[P]) -> Result<Vec<TestCase>> {
    Ok(parse_junit_suites(report_files)?
        .into_iter()
        .flat_map(|suite| suite.test_cases)
        .collect())
}

/// Parses one JUnit document. `label` names the source in errors.
///
/// # Errors
///
/// Returns [`Error::JunitParse`] or [`Error::MalformedJunit`].
pub fn parse_junit_str(xml: &str, label: &str) -> Result<Vec<TestSuite>> {
    let root = parse_tree(xml).map_err(|message| Error::JunitParse {
        path: label.to_string(),
        message,
    })?;

    let mut suites = Vec::new();
    match root.name.as_str() {
        "testsuites" => {
            for child in root.children_named("testsuite") {
                collect_suites(child, &mut suites);
            }
        }
        "testsuite" if root.has_child("testcase") || root.has_child("testsuite") => {
            collect_suites(&root, &mut suites);
        }
        _ => {}
    }

    if suites.is_empty() {
        return Err(Error::MalformedJunit {
            path: label.to_string(),
            root: root.name,
        });
    }
    Ok(suites)
}

fn collect_suites(node: &Node, out: &mut Vec<TestSuite>) {
    let suite = TestSuite {
        name: node.attr("name").unwrap_or_default().to_string(),
        time: node.attr("time").and_then(parse_seconds),
        test_cases: node.children_named("testcase").map(to_test_case).collect(),
    };
    if !suite.test_cases.is_empty() || !node.has_child("testsuite") {
        out.push(suite);
    }
    for nested in node.children_named("testsuite") {
        collect_suites(nested, out);
    }
}

fn to_test_case(node: &Node) -> TestCase {
    let detail = |n: &Node| FailureDetail {
        message: n.attr("message").map(str::to_string),
        kind: n.attr("type").map(str::to_string),
        inner: non_empty(&n.text),
    };
    TestCase {
        name: node.attr("name").unwrap_or_default().to_string(),
        classname: node.attr("classname").unwrap_or_default().to_string(),
        time: node.attr("time").and_then(parse_seconds).unwrap_or(0.0),
        failure: node.children_named("failure").map(detail).collect(),
        error: node.children_named("error").map(detail).collect(),
        skipped: node.children_named("skipped").next().map(|n| Skipped {
            message: n.attr("message").map(str::to_string),
        }),
        system_out: node
            .children_named("system-out")
            .filter_map(|n| non_empty(&n.text))
            .collect(),
        system_err: node
            .children_named("system-err")
            .filter_map(|n| non_empty(&n.text))
            .collect(),
    }
}

/// Reporters write times like `0.001` or `1,234.5`.
fn parse_seconds(raw: &str) -> Option<f64> {
    raw.replace(',', "").trim().parse().ok()
}

fn non_empty(s: &str) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Minimal element tree built from the XML event stream.
#[derive(Debug, Default)]
struct Node {
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn from_start(start: &BytesStart<'_>) -> std::result::Result<Self, String> {
        let mut node = Node {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            ..Node::default()
        };
        for attr in start.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            node.attrs.push((key, value.into_owned()));
        }
        Ok(node)
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    fn has_child(&self, name: &str) -> bool {
        self.children.iter().any(|c| c.name == name)
    }
}

fn parse_tree(xml: &str) -> std::result::Result<Node, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            format!("{} at byte {}", e, reader.buffer_position())
        })?;
        match event {
            Event::Start(start) => stack.push(Node::from_start(&start)?),
            Event::Empty(start) => {
                let node = Node::from_start(&start)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::End(_) => {
                if let Some(node) = stack.pop() {
                    attach(&mut stack, &mut root, node)?;
                }
            }
            Event::Text(text) => {
                let text: Cow<'_, str> = text.unescape().map_err(|e| e.to_string())?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("unexpected end of document inside <{}>", open.name));
    }
    root.ok_or_else(|| "document has no root element".to_string())
}

fn attach(
    stack: &mut [Node],
    root: &mut Option<Node>,
    node: Node,
) -> std::result::Result<(), String> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(node);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(node);
            Ok(())
        }
        None => Err(format!("multiple root elements (second is <{}>)", node.name)),
    }
}
