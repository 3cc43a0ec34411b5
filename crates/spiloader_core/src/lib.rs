//! Manifest-driven provider discovery.
//!
//! A process declares contracts (trait-object types with a dotted id),
//! registers provider constructors, and resolves every provider of a contract
//! from `META-INF/services/<contract-id>` manifests found across an ordered
//! list of search roots.

pub mod config;
pub mod contract;
pub mod discovery;
pub mod harness;
pub mod logging;
pub mod manifest;
pub mod root;

#[doc(hidden)]
pub use inventory;

pub use config::{load_config, ConfigError, DiscoveryConfig};
pub use contract::id::{ContractId, IdentifierError, ProviderId};
pub use contract::registry::{
    erase, Constructor, Contract, ContractEntry, ErasedInstance, ProviderEntry, ProviderRegistry,
    RegisteredProvider, RegistrationSource, RegistryError,
};
pub use discovery::{
    Discovery, DiscoveryEngine, DiscoveryError, DiscoveryPolicy, DiscoveryResult,
    DuplicatePolicy, ErrorPolicy, InstantiationFailure, ListedProvider, Provider,
    ProviderInstance, ServiceLoader,
};
pub use harness::{count_providers, verify, verify_all, CountReport, VerifyError};
pub use logging::{default_log_level, init_logging, init_stderr_logging, logging_status, LogTarget};
pub use manifest::{generated_roots, manifest_path, SERVICES_DIR};
pub use root::{search_path_roots, DirectoryRoot, SearchRoot, StaticRoot};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
