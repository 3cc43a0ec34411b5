//! Counting and verification harness over the discovery engine.

mod verify;

pub use verify::{count_providers, verify, verify_all, CountReport, VerifyError};
