//! Discovery error taxonomy.

use crate::contract::id::IdentifierError;
use std::io;
use thiserror::Error;

pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Why one provider could not be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstantiationFailure {
    #[error("no constructor is registered for this provider id")]
    NotRegistered,
    #[error("constructor failed: {0}")]
    Constructor(String),
}

/// Failure of one `discover` call.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("contract not found: {contract}")]
    ContractNotFound { contract: String },

    #[error(
        "malformed manifest for contract {contract} in root {root} at line {line}: `{content}`: {reason}"
    )]
    MalformedManifest {
        contract: String,
        root: String,
        line: usize,
        content: String,
        reason: IdentifierError,
    },

    #[error("failed to read manifest for contract {contract} in root {root}: {source}")]
    ManifestRead {
        contract: String,
        root: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to instantiate provider {provider} for contract {contract}: {reason}")]
    ProviderInstantiation {
        contract: String,
        provider: String,
        reason: InstantiationFailure,
    },

    #[error("provider {provider} does not implement contract {contract} (expected {expected})")]
    ProviderTypeMismatch {
        contract: String,
        provider: String,
        expected: &'static str,
    },
}

impl DiscoveryError {
    /// Stable short code for logs and machine-readable output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ContractNotFound { .. } => "contract_not_found",
            Self::MalformedManifest { .. } => "malformed_manifest",
            Self::ManifestRead { .. } => "manifest_read_failed",
            Self::ProviderInstantiation { .. } => "provider_instantiation_failed",
            Self::ProviderTypeMismatch { .. } => "provider_type_mismatch",
        }
    }

    /// Contract named by this error.
    pub fn contract(&self) -> &str {
        match self {
            Self::ContractNotFound { contract }
            | Self::MalformedManifest { contract, .. }
            | Self::ManifestRead { contract, .. }
            | Self::ProviderInstantiation { contract, .. }
            | Self::ProviderTypeMismatch { contract, .. } => contract,
        }
    }
}
