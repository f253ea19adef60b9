//! Sample JUnit reports in the shapes emitted by the SDK test runners.
//!
//! Each constant holds a complete JUnit XML document used by the unit tests
//! and the integration tests under `tests/`.

mod kotlin_web5;
mod rust_web5;
mod tbdex_js;

pub use kotlin_web5::KOTLIN_WEB5_JUNIT;
pub use rust_web5::RUST_WEB5_JUNIT;
pub use tbdex_js::TBDEX_JS_JUNIT;
