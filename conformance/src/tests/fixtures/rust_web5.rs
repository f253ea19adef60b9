//! Rust (nextest) report: a single suite per crate.
//!
//! Feature and vector are both encoded in the case path
//! (`test_vectors::test_vectors::<feature>::<vector>`), with the feature in
//! snake case.

/// nextest JUnit report for the web5 Rust core.
pub const RUST_WEB5_JUNIT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuites name="nextest-run" tests="6" failures="1" errors="0" uuid="3a2f7c1e-0b7d-4a52-9c49-d6f0a1b2c3d4" timestamp="2024-08-01T12:00:00.000+00:00" time="0.412">
  <testsuite name="web5" tests="6" disabled="0" errors="0" failures="1">
    <testcase name="test_vectors::test_vectors::crypto_ed25519::sign" classname="web5" timestamp="2024-08-01T12:00:00.010+00:00" time="0.004"/>
    <testcase name="test_vectors::test_vectors::crypto_ed25519::verify" classname="web5" timestamp="2024-08-01T12:00:00.015+00:00" time="0.006"/>
    <testcase name="test_vectors::test_vectors::did_jwk::resolve" classname="web5" timestamp="2024-08-01T12:00:00.021+00:00" time="0.002"/>
    <testcase name="test_vectors::test_vectors::did_dht::resolve" classname="web5" timestamp="2024-08-01T12:00:00.024+00:00" time="0.211">
      <failure type="test failure">thread 'test_vectors::test_vectors::did_dht::resolve' panicked at crates/web5/src/dids/methods/did_dht/mod.rs:412:9:
assertion `left == right` failed
  left: NotFound
 right: Ok</failure>
      <system-err>called `Result::unwrap()` on an `Err` value</system-err>
    </testcase>
    <testcase name="test_vectors::test_vectors::credentials::verify" classname="web5" timestamp="2024-08-01T12:00:00.240+00:00" time="0.101"/>
    <testcase name="credentials::tests::create_roundtrip" classname="web5" timestamp="2024-08-01T12:00:00.345+00:00" time="0.067"/>
  </testsuite>
</testsuites>
"#;
