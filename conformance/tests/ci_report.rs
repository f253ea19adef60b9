//! CI report mode end to end: spec checkout and JUnit files on disk, runner
//! outputs and job summary written to temp files.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use specs_conformance::github::{CommentThread, CommentUser, IssueComment};
use specs_conformance::tests::fixtures::TBDEX_JS_JUNIT;
use specs_conformance::{handle_ci_report, ActionInputs, CommentTarget, JobOutcome, Result, Runner};

const VECTOR: &str = r#"{"description": "sample", "input": {}, "output": {}}"#;

struct Workspace {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

impl Workspace {
    /// tbdex spec with five protocol vectors and the tbdex-js report.
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let vectors = root.join("tbdex/hosted/test-vectors/protocol/vectors");
        fs::create_dir_all(&vectors).unwrap();
        for name in [
            "parse-balance",
            "parse-cancel",
            "parse-close",
            "parse-offering",
            "parse-rfq",
        ] {
            fs::write(vectors.join(format!("{name}.json")), VECTOR).unwrap();
        }
        fs::write(root.join("tbdex/hosted/test-vectors/package.json"), "{}").unwrap();
        fs::create_dir_all(root.join("reports")).unwrap();
        fs::write(root.join("reports/tbdex.xml"), TBDEX_JS_JUNIT).unwrap();
        Self { _dir: dir, root }
    }

    fn inputs(&self, extra: &[(&str, &str)]) -> ActionInputs {
        let mut env: HashMap<String, String> = HashMap::new();
        env.insert(
            "INPUT_JUNIT-REPORT-PATHS".into(),
            self.root.join("reports/*.xml").display().to_string(),
        );
        env.insert(
            "INPUT_SPEC-PATH".into(),
            format!("{}/", self.root.join("tbdex").display()),
        );
        for (k, v) in extra {
            env.insert(k.to_string(), v.to_string());
        }
        ActionInputs::from_lookup(move |var| env.get(var).cloned()).unwrap()
    }

    fn runner(&self) -> Runner {
        Runner::new(Some(self.output()), Some(self.summary()))
    }

    fn output(&self) -> PathBuf {
        self.root.join("github_output")
    }

    fn summary(&self) -> PathBuf {
        self.root.join("step_summary.html")
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_default()
}

#[derive(Default)]
struct RecordingThread {
    created: RefCell<Vec<String>>,
}

impl CommentThread for RecordingThread {
    fn comments(&self) -> Result<Vec<IssueComment>> {
        Ok(vec![IssueComment {
            id: 9,
            body: Some("LGTM".into()),
            user: Some(CommentUser {
                login: "reviewer".into(),
                kind: "User".into(),
            }),
            html_url: String::new(),
        }])
    }

    fn update(&self, _id: u64, _body: &str) -> Result<IssueComment> {
        unreachable!("no bot comment to update")
    }

    fn create(&self, body: &str) -> Result<IssueComment> {
        self.created.borrow_mut().push(body.to_string());
        Ok(IssueComment {
            id: 10,
            body: Some(body.to_string()),
            user: None,
            html_url: String::new(),
        })
    }
}

#[test]
fn failed_cases_fail_the_job() {
    let ws = Workspace::new();
    let inputs = ws.inputs(&[("INPUT_FAIL-ON-MISSING-VECTORS", "true")]);
    let run = handle_ci_report(&inputs, &ws.runner(), CommentTarget::NotPullRequest).unwrap();

    let report = &run.report;
    assert_eq!(report.total_junit_files, 1);
    assert_eq!(report.total_test_vectors, 5);
    assert_eq!(report.total_junit_test_cases, 4);
    assert_eq!(report.spec_test_cases, 4);
    assert_eq!(report.spec_passed_test_cases, 1);
    assert_eq!(report.spec_failed_test_cases, 2);
    assert_eq!(report.spec_skipped_test_cases, 1);
    let names = |vs: &[specs_conformance::TestVector]| {
        vs.iter().map(|v| v.name.clone()).collect::<Vec<_>>()
    };
    assert_eq!(names(&report.success_vectors), ["parse_balance"]);
    assert_eq!(names(&report.failed_vectors), ["parse_cancel", "parse_offering"]);
    assert_eq!(names(&report.skipped_vectors), ["parse_close"]);
    assert_eq!(names(&report.missing_vectors), ["parse_rfq"]);

    assert_eq!(
        run.outcome,
        JobOutcome::Failed("❌ Failed test vectors found".into())
    );

    let output = read(&ws.output());
    assert!(output.contains("summary<<ghadelimiter_"));
    assert!(output.contains("test-vector-report<<ghadelimiter_"));
    assert!(output.contains("\"totalTestVectors\": 5"));
    assert!(!output.contains("success<<"));

    let summary = read(&ws.summary());
    assert_eq!(summary, run.summary);
    assert!(summary.starts_with("<h2>TBD Spec Test Vectors Report</h2>\n"));
    assert!(summary.contains("ℹ️ 1 out of 5 test vectors passed successfully."));
    assert!(summary.contains("<h3>❌ Failed Vectors (2)</h3>"));
    assert!(summary.contains("<h3>❌ Missing Vectors (1)</h3>"));
    assert!(summary.contains("<h3>⚠️ Skipped Vectors (1)</h3>"));
}

#[test]
fn lenient_policy_succeeds_and_comments_on_the_pull_request() {
    let ws = Workspace::new();
    let inputs = ws.inputs(&[
        ("INPUT_FAIL-ON-FAILED-TEST-CASES", "false"),
        ("INPUT_PACKAGE-NAME", "@tbdex/protocol"),
    ]);
    let thread = RecordingThread::default();
    let run = handle_ci_report(&inputs, &ws.runner(), CommentTarget::Thread(&thread)).unwrap();

    assert_eq!(
        run.outcome,
        JobOutcome::Success {
            warnings: vec!["⚠️ Skipped test vectors found".into()]
        }
    );
    assert!(read(&ws.output()).contains("success<<"));
    let created = thread.created.borrow();
    assert_eq!(created.len(), 1);
    assert!(created[0].starts_with("<h2>TBD Spec Test Vectors Report (@tbdex/protocol)</h2>"));
}

#[test]
fn pull_request_without_token_fails_the_job() {
    let ws = Workspace::new();
    let inputs = ws.inputs(&[("INPUT_FAIL-ON-FAILED-TEST-CASES", "false")]);
    let run = handle_ci_report(
        &inputs,
        &ws.runner(),
        CommentTarget::MissingToken { number: 123 },
    )
    .unwrap();
    assert_eq!(
        run.outcome,
        JobOutcome::Failed("No git token found to add the requested PR comment".into())
    );
    assert!(!read(&ws.output()).contains("success<<"));
}

#[test]
fn comments_disabled_ignores_the_pull_request() {
    let ws = Workspace::new();
    let inputs = ws.inputs(&[
        ("INPUT_FAIL-ON-FAILED-TEST-CASES", "false"),
        ("INPUT_COMMENT-ON-PR", "false"),
    ]);
    let run = handle_ci_report(
        &inputs,
        &ws.runner(),
        CommentTarget::MissingToken { number: 123 },
    )
    .unwrap();
    assert!(run.outcome.is_success());
}

#[test]
fn prefix_filter_drops_unprefixed_cases() {
    let ws = Workspace::new();
    let inputs = ws.inputs(&[("INPUT_TEST-CASES-PREFIX", "Web5TestVectors")]);
    let run = handle_ci_report(&inputs, &ws.runner(), CommentTarget::NotPullRequest).unwrap();
    assert_eq!(run.report.spec_test_cases, 0);
    assert_eq!(run.report.missing_vectors.len(), 5);
    assert!(run.outcome.is_success());
}
