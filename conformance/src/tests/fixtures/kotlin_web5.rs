//! Kotlin (Gradle) report: one suite per feature class.
//!
//! The feature is encoded in the suite name
//! (`Web5TestVectorsTest$Web5TestVectors<Feature>`) and the vector is the test
//! method name.

/// Gradle JUnit report for the web5 Kotlin bindings.
pub const KOTLIN_WEB5_JUNIT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuites>
  <testsuite name="web5.sdk.Web5TestVectorsTest$Web5TestVectorsCryptoEd25519" tests="2" skipped="0" failures="0" errors="0" time="0.031">
    <properties/>
    <testcase name="sign()" classname="web5.sdk.Web5TestVectorsTest$Web5TestVectorsCryptoEd25519" time="0.024"/>
    <testcase name="verify()" classname="web5.sdk.Web5TestVectorsTest$Web5TestVectorsCryptoEd25519" time="0.007"/>
    <system-out><![CDATA[]]></system-out>
    <system-err><![CDATA[]]></system-err>
  </testsuite>
  <testsuite name="web5.sdk.Web5TestVectorsTest$Web5TestVectorsDidJwk" tests="1" skipped="0" failures="0" errors="0" time="0.012">
    <properties/>
    <testcase name="resolve()" classname="web5.sdk.Web5TestVectorsTest$Web5TestVectorsDidJwk" time="0.012"/>
  </testsuite>
</testsuites>
"#;
