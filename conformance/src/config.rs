//! Action inputs.
//!
//! The runner exposes each input `foo-bar` as `INPUT_FOO-BAR`; the
//! shell-friendly `INPUT_FOO_BAR` is accepted too. Values are trimmed and an
//! empty value counts as unset. Every problem found while reading is collected
//! and reported at once as [`Error::Config`].

use std::path::PathBuf;
use std::str::FromStr;

use regex::Regex;

use crate::correlate::{Correlator, RegexPairMatcher, SubstringMatcher};
use crate::error::{Error, Result};

/// Plain environment flag that turns ledger and page writes into logged no-ops.
pub const SKIP_WRITE_ENV: &str = "SKIP_WRITE_CONFORMANCE_JSON";

/// Page the conformance matrix is published to by default.
pub const DEFAULT_HTML_REPORT_FILE: &str = "index.html";

/// What the run does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReleaseMode {
    /// CI report for one SDK run.
    #[default]
    None,
    /// Record a spec release's catalog in the ledger.
    Spec,
    /// Record an SDK release's results in the ledger.
    Sdk,
}

impl FromStr for ReleaseMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(Self::None),
            "spec" => Ok(Self::Spec),
            "sdk" => Ok(Self::Sdk),
            other => Err(format!(
                "Invalid value for release-mode: expected none, spec or sdk, got '{other}'"
            )),
        }
    }
}

/// Reads `INPUT_*` variables through a lookup function, collecting errors.
pub struct InputReader<'a> {
    lookup: Box<dyn Fn(&str) -> Option<String> + 'a>,
    errors: Vec<String>,
}

impl<'a> InputReader<'a> {
    /// Reads through `lookup`, which maps a variable name to its value.
    pub fn new(lookup: impl Fn(&str) -> Option<String> + 'a) -> Self {
        Self {
            lookup: Box::new(lookup),
            errors: Vec::new(),
        }
    }

    /// Take ownership of errors.
    pub fn take_errors(&mut self) -> Vec<String> {
        std::mem::take(&mut self.errors)
    }

    /// Raw environment value, not an input.
    pub fn env(&self, var: &str) -> Option<String> {
        (self.lookup)(var)
    }

    /// Trimmed value of input `name`, `None` when unset or empty.
    pub fn get(&self, name: &str) -> Option<String> {
        let upper = name.to_uppercase();
        let underscored = upper.replace('-', "_");
        [format!("INPUT_{upper}"), format!("INPUT_{underscored}")]
            .iter()
            .find_map(|var| (self.lookup)(var))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Input value or `default`.
    pub fn string(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    /// Input value, recording an error when unset.
    pub fn required(&mut self, name: &str) -> String {
        match self.get(name) {
            Some(value) => value,
            None => {
                self.errors.push(format!("Input required and not supplied: {name}"));
                String::new()
            }
        }
    }

    /// Boolean input.
    ///
    /// Accepts: 1, true, yes, on (for true)
    ///          0, false, no, off (for false)
    pub fn bool(&mut self, name: &str, default: bool) -> bool {
        let Some(value) = self.get(name) else {
            return default;
        };
        match value.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                self.errors.push(format!(
                    "Invalid value for {name}: expected boolean (true/false/1/0/yes/no), got '{value}'"
                ));
                default
            }
        }
    }

    /// Compiled regex input, `None` when unset.
    pub fn regex(&mut self, name: &str) -> Option<Regex> {
        let pattern = self.get(name)?;
        match Regex::new(&pattern) {
            Ok(re) => Some(re),
            Err(source) => {
                let err = Error::InvalidRegex {
                    input: name.to_string(),
                    pattern,
                    source,
                };
                self.errors.push(err.to_string());
                None
            }
        }
    }

    /// Parsed input, recording the parser's message on failure.
    pub fn parse<T>(&mut self, name: &str) -> T
    where
        T: FromStr<Err = String> + Default,
    {
        match T::from_str(&self.get(name).unwrap_or_default()) {
            Ok(value) => value,
            Err(message) => {
                self.errors.push(message);
                T::default()
            }
        }
    }
}

/// Every recognised action input.
#[derive(Debug, Clone, Default)]
pub struct ActionInputs {
    /// Newline-separated JUnit report globs.
    pub junit_report_paths: String,
    /// Spec root scanned for `test-vectors/`.
    pub spec_path: PathBuf,
    /// Case-name prefix filter for substring correlation.
    pub test_cases_prefix: String,
    /// Suite filter for regex correlation.
    pub suite_name_regex: Option<Regex>,
    /// Feature extractor for regex correlation.
    pub feature_regex: Option<Regex>,
    /// Vector extractor; its presence selects regex correlation.
    pub vector_regex: Option<Regex>,
    /// Read the feature from the case name.
    pub extract_feature_on_test_case_name: bool,
    /// UpperCamelCase the extracted feature.
    pub prettify_feature: bool,
    /// GitHub token.
    pub git_token: Option<String>,
    /// Upsert the summary as a PR comment.
    pub comment_on_pr: bool,
    /// Fail when a vector has no case.
    pub fail_on_missing_vectors: bool,
    /// Fail when a matched case failed.
    pub fail_on_failed_test_cases: bool,
    /// What the run does.
    pub release_mode: ReleaseMode,
    /// Repository of the released artifact.
    pub release_repo: String,
    /// Tag of the SDK release.
    pub release_tag: String,
    /// SDK package name.
    pub release_package_name: String,
    /// Spec name; selects the ledger document.
    pub spec_name: String,
    /// Spec tag.
    pub spec_tag: String,
    /// Label appended to the summary header.
    pub package_name: Option<String>,
    /// Publish the conformance matrix page after a release.
    pub html_report_write: bool,
    /// Page the matrix is published to.
    pub html_report_file: String,
    /// Local directory used instead of the gh-pages branch.
    pub conformance_store_dir: Option<PathBuf>,
    /// Writes are logged and dropped.
    pub skip_write: bool,
}

impl ActionInputs {
    /// Reads inputs from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] listing every missing or invalid input.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads inputs through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] listing every missing or invalid input.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut reader = InputReader::new(lookup);
        let release_mode: ReleaseMode = reader.parse("release-mode");

        let mut inputs = Self {
            junit_report_paths: reader.string("junit-report-paths", ""),
            spec_path: PathBuf::from(reader.string("spec-path", "")),
            test_cases_prefix: reader.string("test-cases-prefix", ""),
            suite_name_regex: reader.regex("suite-name-regex"),
            feature_regex: reader.regex("feature-regex"),
            vector_regex: reader.regex("vector-regex"),
            extract_feature_on_test_case_name: reader.bool("extract-feature-on-test-case-name", false),
            prettify_feature: reader.bool("prettify-feature", false),
            git_token: reader.get("git-token"),
            comment_on_pr: reader.bool("comment-on-pr", true),
            fail_on_missing_vectors: reader.bool("fail-on-missing-vectors", false),
            fail_on_failed_test_cases: reader.bool("fail-on-failed-test-cases", true),
            release_mode,
            release_repo: reader.string("release-repo", ""),
            release_tag: reader.string("release-tag", ""),
            release_package_name: reader.string("release-package-name", ""),
            spec_name: reader.string("spec-name", ""),
            spec_tag: reader.string("spec-tag", ""),
            package_name: reader.get("package-name"),
            html_report_write: reader.bool("html-report-write", false),
            html_report_file: reader.string("html-report-file", DEFAULT_HTML_REPORT_FILE),
            conformance_store_dir: reader.get("conformance-store-dir").map(PathBuf::from),
            skip_write: reader.env(SKIP_WRITE_ENV).as_deref() == Some("true"),
        };

        let required: &[&str] = match release_mode {
            ReleaseMode::None => &["junit-report-paths", "spec-path"],
            ReleaseMode::Spec => &["spec-path", "release-repo", "spec-name", "spec-tag"],
            ReleaseMode::Sdk => &[
                "junit-report-paths",
                "vector-regex",
                "release-repo",
                "release-tag",
                "release-package-name",
                "spec-name",
                "spec-tag",
            ],
        };
        for name in required {
            reader.required(name);
        }
        if inputs.extract_feature_on_test_case_name && inputs.vector_regex.is_none() {
            reader
                .errors
                .push("extract-feature-on-test-case-name requires vector-regex".to_string());
        }
        if inputs.vector_regex.is_some()
            && !inputs.extract_feature_on_test_case_name
            && reader.get("feature-regex").is_none()
        {
            reader.errors.push(
                "vector-regex requires feature-regex or extract-feature-on-test-case-name"
                    .to_string(),
            );
        }

        let errors = reader.take_errors();
        if !errors.is_empty() {
            return Err(Error::Config(errors));
        }
        inputs.spec_path = normalize_spec_path(inputs.spec_path);
        Ok(inputs)
    }

    /// The configured correlation strategy.
    pub fn correlator(&self) -> Correlator {
        match self.regex_pair() {
            Some(matcher) => Correlator::RegexPair(matcher),
            None => Correlator::Substring(SubstringMatcher::new(self.test_cases_prefix.clone())),
        }
    }

    /// The regex-pair matcher, when a vector regex is configured.
    pub fn regex_pair(&self) -> Option<RegexPairMatcher> {
        let vector = self.vector_regex.clone()?;
        Some(RegexPairMatcher {
            extract_feature_on_test_case_name: self.extract_feature_on_test_case_name,
            prettify_feature: self.prettify_feature,
            ..RegexPairMatcher::new(self.suite_name_regex.clone(), self.feature_regex.clone(), vector)
        })
    }
}

/// `spec-path` may be a `./dir` or end in a slash.
fn normalize_spec_path(path: PathBuf) -> PathBuf {
    let s = path.to_string_lossy();
    let trimmed = s.trim_end_matches('/');
    if trimmed.is_empty() {
        path
    } else {
        PathBuf::from(trimmed)
    }
}
