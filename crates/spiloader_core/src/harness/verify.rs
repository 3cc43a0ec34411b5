//! Count providers of a contract and compare against an expectation.
//!
//! # Invariants
//! - Discovery is drained exactly once per call; each provider is
//!   constructed once.
//! - A mismatch is definitive; there are no retries.

use crate::discovery::{DiscoveryEngine, DiscoveryError};
use log::{error, info};
use serde::Serialize;
use thiserror::Error;

/// Outcome of draining discovery for one contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountReport {
    pub contract: String,
    /// Provider ids in yield order.
    pub providers: Vec<String>,
    pub count: usize,
}

/// Verification failure.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("provider count mismatch for contract {contract}: expected {expected}, found {actual}")]
    CountMismatch {
        contract: String,
        expected: usize,
        actual: usize,
        providers: Vec<String>,
    },
}

impl VerifyError {
    pub fn contract(&self) -> &str {
        match self {
            Self::Discovery(err) => err.contract(),
            Self::CountMismatch { contract, .. } => contract,
        }
    }
}

/// Drains `discover(contract)` and records every yielded provider id.
pub fn count_providers(
    engine: &DiscoveryEngine,
    contract: &str,
) -> Result<CountReport, DiscoveryError> {
    let discovery = engine.discover(contract)?;
    let contract = discovery.contract().to_string();
    let mut providers = Vec::new();
    for instance in discovery {
        providers.push(instance?.provider().to_string());
    }
    Ok(CountReport {
        contract,
        count: providers.len(),
        providers,
    })
}

/// Verifies that `contract` resolves to exactly `expected` providers.
pub fn verify(
    engine: &DiscoveryEngine,
    contract: &str,
    expected: usize,
) -> Result<CountReport, VerifyError> {
    let report = match count_providers(engine, contract) {
        Ok(report) => report,
        Err(err) => {
            error!(
                "event=verify module=harness status=error contract={} error_code={} error={}",
                contract.trim(),
                err.code(),
                err
            );
            return Err(err.into());
        }
    };

    if report.count != expected {
        error!(
            "event=verify module=harness status=error contract={} error_code=count_mismatch expected={} actual={}",
            report.contract, expected, report.count
        );
        return Err(VerifyError::CountMismatch {
            contract: report.contract,
            expected,
            actual: report.count,
            providers: report.providers,
        });
    }

    info!(
        "event=verify module=harness status=ok contract={} count={}",
        report.contract, report.count
    );
    Ok(report)
}

/// Runs [`verify`] for each `(contract, expected)` pair, in order.
pub fn verify_all(
    engine: &DiscoveryEngine,
    expectations: &[(&str, usize)],
) -> Vec<Result<CountReport, VerifyError>> {
    expectations
        .iter()
        .map(|(contract, expected)| verify(engine, contract, *expected))
        .collect()
}
