//! Vector/run correlation.
//!
//! Links JUnit cases to cataloged vectors. Two strategies exist, chosen once
//! from configuration and wrapped in [`Correlator`]:
//!
//! - [`SubstringMatcher`]: the lowercased case name must contain the vector
//!   name as a whitespace-separated token and the vector's category anywhere.
//! - [`RegexPairMatcher`]: a feature and a vector identifier are extracted
//!   from the suite and case names and looked up exactly.

use regex::{Captures, Regex};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::junit::{TestCase, TestSuite};
use crate::vectors::{upper_camel_case, FeatureNaming, VectorCatalog};

/// Outcome of matching one case against a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseMatch {
    /// The case exercises the vector at this catalog position.
    Vector(usize),
    /// Identifiers were extracted but no such vector is declared.
    Dangling {
        /// Extracted feature.
        feature: String,
        /// Extracted vector name.
        vector: String,
    },
    /// The case is not a test-vector case.
    Ignored,
}

/// A matching strategy.
pub trait VectorMatcher {
    /// Feature naming the catalog must be built with for lookups to work.
    fn naming(&self) -> FeatureNaming;

    /// Matches one case, given the suite it belongs to.
    fn match_case(&self, suite: &TestSuite, case: &TestCase, catalog: &VectorCatalog) -> CaseMatch;
}

/// Token-and-substring matching on the case name alone.
#[derive(Debug, Clone, Default)]
pub struct SubstringMatcher {
    /// Cases whose name does not start with this prefix are ignored. Empty disables the filter.
    pub prefix: String,
}

impl SubstringMatcher {
    /// Creates a matcher with the given case-name prefix filter.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl VectorMatcher for SubstringMatcher {
    fn naming(&self) -> FeatureNaming {
        FeatureNaming::Category
    }

    fn match_case(&self, _suite: &TestSuite, case: &TestCase, catalog: &VectorCatalog) -> CaseMatch {
        if !self.prefix.is_empty() && !case.name.starts_with(&self.prefix) {
            return CaseMatch::Ignored;
        }
        let lowered = case.name.to_lowercase();
        catalog
            .vectors()
            .iter()
            .position(|v| {
                lowered.split_whitespace().any(|word| word == v.name) && lowered.contains(&v.feature)
            })
            .map_or(CaseMatch::Ignored, CaseMatch::Vector)
    }
}

/// Regex extraction of `(feature, vector)` from suite and case names.
#[derive(Debug, Clone)]
pub struct RegexPairMatcher {
    /// Suites whose name does not match are skipped. `None` accepts every suite.
    pub suite_name: Option<Regex>,
    /// Feature extractor applied to the suite name (capture group 1).
    pub feature: Option<Regex>,
    /// Vector extractor applied to the case name (last capture group).
    pub vector: Regex,
    /// Take the feature from capture group 1 of `vector` on the case name.
    pub extract_feature_on_test_case_name: bool,
    /// Convert the extracted feature to UpperCamelCase.
    pub prettify_feature: bool,
}

impl RegexPairMatcher {
    /// Creates a matcher that reads the feature from the suite name.
    pub fn new(suite_name: Option<Regex>, feature: Option<Regex>, vector: Regex) -> Self {
        Self {
            suite_name,
            feature,
            vector,
            extract_feature_on_test_case_name: false,
            prettify_feature: false,
        }
    }

    /// Extracts `(feature, vector)` identifiers, if the suite and case qualify.
    pub fn extract(&self, suite_name: &str, case_name: &str) -> Option<(String, String)> {
        if let Some(filter) = &self.suite_name {
            if !filter.is_match(suite_name) {
                return None;
            }
        }

        let case_caps = self.vector.captures(case_name)?;
        let raw_feature = if self.extract_feature_on_test_case_name {
            case_caps.get(1)?.as_str().to_string()
        } else {
            let caps = self.feature.as_ref()?.captures(suite_name)?;
            caps.get(1)?.as_str().to_string()
        };
        let vector = last_group(&case_caps)?;

        let feature = if self.prettify_feature {
            upper_camel_case(&raw_feature)
        } else {
            raw_feature
        };
        Some((feature, vector))
    }
}

/// The last participating capture group, or the whole match without groups.
fn last_group(caps: &Captures<'_>) -> Option<String> {
    (1..caps.len())
        .rev()
        .find_map(|i| caps.get(i))
        .or_else(|| caps.get(0))
        .map(|m| m.as_str().to_string())
}

impl VectorMatcher for RegexPairMatcher {
    fn naming(&self) -> FeatureNaming {
        FeatureNaming::Feature
    }

    fn match_case(&self, suite: &TestSuite, case: &TestCase, catalog: &VectorCatalog) -> CaseMatch {
        match self.extract(&suite.name, &case.name) {
            Some((feature, vector)) => match catalog.position(&feature, &vector) {
                Some(index) => CaseMatch::Vector(index),
                None => CaseMatch::Dangling { feature, vector },
            },
            None => CaseMatch::Ignored,
        }
    }
}

/// The configured strategy.
#[derive(Debug, Clone)]
pub enum Correlator {
    /// Token and substring matching.
    Substring(SubstringMatcher),
    /// Regex extraction.
    RegexPair(RegexPairMatcher),
}

impl VectorMatcher for Correlator {
    fn naming(&self) -> FeatureNaming {
        match self {
            Self::Substring(m) => m.naming(),
            Self::RegexPair(m) => m.naming(),
        }
    }

    fn match_case(&self, suite: &TestSuite, case: &TestCase, catalog: &VectorCatalog) -> CaseMatch {
        match self {
            Self::Substring(m) => m.match_case(suite, case, catalog),
            Self::RegexPair(m) => m.match_case(suite, case, catalog),
        }
    }
}

/// A JUnit result that named a vector the catalog does not declare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingResult {
    /// Extracted feature.
    pub feature: String,
    /// Extracted vector name.
    pub vector: String,
    /// Suite the case came from.
    pub suite: String,
    /// Case name.
    pub case: String,
}

/// Counters produced by [`correlate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationStats {
    /// Every JUnit case seen.
    pub total_junit_test_cases: usize,
    /// Cases attached to a vector.
    pub total_spec_test_cases: usize,
    /// Extracted results with no declared vector.
    pub dangling: Vec<DanglingResult>,
}

/// Attaches every matching case to its vector, in suite and case order.
pub fn correlate<M: VectorMatcher + ?Sized>(
    catalog: &mut VectorCatalog,
    suites: &[TestSuite],
    matcher: &M,
) -> CorrelationStats {
    let mut stats = CorrelationStats::default();
    for suite in suites {
        for case in &suite.test_cases {
            stats.total_junit_test_cases += 1;
            match matcher.match_case(suite, case, catalog) {
                CaseMatch::Vector(index) => {
                    if let Some(vector) = catalog.vectors_mut().get_mut(index) {
                        debug!(feature = %vector.feature, vector = %vector.name, case = %case.name, "matched");
                        vector.test_cases.push(case.clone());
                        stats.total_spec_test_cases += 1;
                    }
                }
                CaseMatch::Dangling { feature, vector } => {
                    warn!(
                        feature = %feature,
                        vector = %vector,
                        suite = %suite.name,
                        case = %case.name,
                        "Test vector {feature}/{vector} not found in spec, skipping JUnit result"
                    );
                    stats.dangling.push(DanglingResult {
                        feature,
                        vector,
                        suite: suite.name.clone(),
                        case: case.name.clone(),
                    });
                }
                CaseMatch::Ignored => {}
            }
        }
    }
    info!(
        total_junit_test_cases = stats.total_junit_test_cases,
        total_spec_test_cases = stats.total_spec_test_cases,
        dangling = stats.dangling.len(),
        "JUnit test cases correlated"
    );
    stats
}

/// A case whose identifiers were extracted, independent of any catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedCase {
    /// Extracted feature.
    pub feature: String,
    /// Extracted vector name.
    pub name: String,
    /// The source case.
    pub test_case: TestCase,
}

/// Extracts identifiers from every qualifying case, in suite and case order.
pub fn extract_vector_cases(suites: &[TestSuite], matcher: &RegexPairMatcher) -> Vec<ExtractedCase> {
    suites
        .iter()
        .flat_map(|suite| suite.test_cases.iter().map(move |case| (suite, case)))
        .filter_map(|(suite, case)| {
            matcher
                .extract(&suite.name, &case.name)
                .map(|(feature, name)| ExtractedCase {
                    feature,
                    name,
                    test_case: case.clone(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::junit::parse_junit_str;
    use crate::tests::fixtures;
    use crate::vectors::TestVector;

    fn catalog(naming: FeatureNaming, ids: &[(&str, &str)]) -> VectorCatalog {
        VectorCatalog::from_vectors(ids.iter().map(|(feature, name)| {
            let feature = naming.apply(feature);
            let file = format!("test-vectors/{feature}/{name}.json");
            TestVector::new(feature, *name, file)
        }))
        .unwrap()
    }

    fn re(pattern: &str) -> Regex {
        Regex::new(pattern).unwrap()
    }

    fn kotlin_matcher() -> RegexPairMatcher {
        RegexPairMatcher::new(
            None,
            Some(re(r"Web5TestVectorsTest\$Web5TestVectors(\w+)")),
            re(r"(\w+)"),
        )
    }

    fn rust_matcher() -> RegexPairMatcher {
        RegexPairMatcher {
            extract_feature_on_test_case_name: true,
            prettify_feature: true,
            ..RegexPairMatcher::new(None, None, re(r"test_vectors::test_vectors::(.+)::(.+)$"))
        }
    }

    #[test]
    fn kotlin_suite_and_case_names() {
        let extracted = kotlin_matcher().extract(
            "web5.sdk.Web5TestVectorsTest$Web5TestVectorsCryptoEd25519",
            "sign()",
        );
        assert_eq!(extracted, Some(("CryptoEd25519".into(), "sign".into())));
    }

    #[test]
    fn feature_from_case_name_is_prettified() {
        let extracted = rust_matcher().extract("web5", "test_vectors::test_vectors::crypto_ed25519::sign");
        assert_eq!(extracted, Some(("CryptoEd25519".into(), "sign".into())));
        assert_eq!(rust_matcher().extract("web5", "credentials::tests::create_roundtrip"), None);
    }

    #[test]
    fn last_capture_group_names_the_vector() {
        let matcher = RegexPairMatcher::new(
            Some(re("^TbdexTestVectors")),
            Some(re(r"TbdexTestVectors(\w+)")),
            re(r"TbdexTestVectors(\w+) (\w+)"),
        );
        assert_eq!(
            matcher.extract("TbdexTestVectorsProtocol", "TbdexTestVectorsProtocol parse_balance"),
            Some(("Protocol".into(), "parse_balance".into()))
        );
        assert_eq!(matcher.extract("OtherSuite", "TbdexTestVectorsProtocol parse_balance"), None);
    }

    #[test]
    fn regex_without_groups_uses_whole_match() {
        let matcher = RegexPairMatcher::new(None, Some(re("(Did\\w+)")), re("[a-z]+"));
        assert_eq!(
            matcher.extract("DidJwk", "resolve()"),
            Some(("DidJwk".into(), "resolve".into()))
        );
    }

    #[test]
    fn missing_feature_source_extracts_nothing() {
        let matcher = RegexPairMatcher::new(None, None, re(r"(\w+)"));
        assert_eq!(matcher.extract("Suite", "sign()"), None);
    }

    #[test]
    fn substring_needs_token_and_category() {
        let mut cat = catalog(FeatureNaming::Category, &[("protocol", "parse_balance"), ("protocol", "parse_cancel")]);
        let suites = parse_junit_str(fixtures::TBDEX_JS_JUNIT, "tbdex.xml").unwrap();
        let stats = correlate(&mut cat, &suites, &SubstringMatcher::default());

        assert_eq!(stats.total_junit_test_cases, 4);
        assert_eq!(stats.total_spec_test_cases, 2);
        assert!(stats.dangling.is_empty());
        assert_eq!(cat.vectors()[0].test_cases.len(), 1);
        assert_eq!(cat.vectors()[1].test_cases.len(), 1);

        let partial = TestCase::named("TbdexTestVectorsProtocol parse_balance_extra");
        let suite = TestSuite::default();
        assert_eq!(SubstringMatcher::default().match_case(&suite, &partial, &cat), CaseMatch::Ignored);
    }

    #[test]
    fn substring_tokens_split_on_any_whitespace() {
        let cat = catalog(FeatureNaming::Category, &[("protocol", "parse_balance")]);
        let suite = TestSuite::default();
        for name in [
            "TbdexTestVectorsProtocol\tparse_balance",
            "TbdexTestVectorsProtocol  parse_balance\n",
        ] {
            assert_eq!(
                SubstringMatcher::default().match_case(&suite, &TestCase::named(name), &cat),
                CaseMatch::Vector(0),
                "{name:?}"
            );
        }
    }

    #[test]
    fn substring_prefix_filter() {
        let cat = catalog(FeatureNaming::Category, &[("protocol", "parse_balance")]);
        let case = TestCase::named("TbdexTestVectorsProtocol parse_balance");
        let suite = TestSuite::default();
        assert_eq!(
            SubstringMatcher::new("Tbdex").match_case(&suite, &case, &cat),
            CaseMatch::Vector(0)
        );
        assert_eq!(
            SubstringMatcher::new("Web5").match_case(&suite, &case, &cat),
            CaseMatch::Ignored
        );
    }

    #[test]
    fn regex_pair_reports_dangling_results() {
        let mut cat = catalog(
            FeatureNaming::Feature,
            &[("crypto_ed25519", "sign"), ("crypto_ed25519", "verify"), ("did_jwk", "resolve")],
        );
        let suites = parse_junit_str(fixtures::RUST_WEB5_JUNIT, "rust.xml").unwrap();
        let stats = correlate(&mut cat, &suites, &Correlator::RegexPair(rust_matcher()));

        assert_eq!(stats.total_junit_test_cases, 6);
        assert_eq!(stats.total_spec_test_cases, 3);
        let dangling: Vec<(&str, &str)> = stats
            .dangling
            .iter()
            .map(|d| (d.feature.as_str(), d.vector.as_str()))
            .collect();
        assert_eq!(dangling, [("DidDht", "resolve"), ("Credentials", "verify")]);
    }

    #[test]
    fn repeated_runs_attach_to_the_same_vector() {
        let mut cat = catalog(FeatureNaming::Feature, &[("crypto_ed25519", "sign")]);
        let suite = TestSuite {
            name: "web5.sdk.Web5TestVectorsTest$Web5TestVectorsCryptoEd25519".into(),
            time: None,
            test_cases: vec![TestCase::named("sign()"), TestCase::named("sign()")],
        };
        let stats = correlate(&mut cat, &[suite], &kotlin_matcher());
        assert_eq!(stats.total_spec_test_cases, 2);
        assert_eq!(cat.vectors()[0].test_cases.len(), 2);
    }

    #[test]
    fn extraction_is_catalog_independent() {
        let suites = parse_junit_str(fixtures::KOTLIN_WEB5_JUNIT, "kotlin.xml").unwrap();
        let cases = extract_vector_cases(&suites, &kotlin_matcher());
        let ids: Vec<(&str, &str)> = cases.iter().map(|c| (c.feature.as_str(), c.name.as_str())).collect();
        assert_eq!(ids, [("CryptoEd25519", "sign"), ("CryptoEd25519", "verify"), ("DidJwk", "resolve")]);
    }

    #[test]
    fn correlator_declares_naming() {
        assert_eq!(Correlator::Substring(SubstringMatcher::default()).naming(), FeatureNaming::Category);
        assert_eq!(Correlator::RegexPair(rust_matcher()).naming(), FeatureNaming::Feature);
    }
}
