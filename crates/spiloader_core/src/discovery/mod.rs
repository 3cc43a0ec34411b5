//! Provider discovery.
//!
//! # Responsibility
//! - Resolve a contract id to a lazy sequence of freshly constructed
//!   provider instances, read from manifests across ordered search roots.
//! - Report failures with the contract, root, line and provider involved.
//!
//! # Invariants
//! - A root without a manifest contributes nothing and is not an error.
//! - Ordering is fixed by root order and manifest contents; root order is an
//!   input of the host, not something the engine decides.
//! - Every yielded instance has passed the contract type check.

mod engine;
mod error;
mod policy;
mod typed;

pub use engine::{Discovery, DiscoveryEngine, ListedProvider, ProviderInstance};
pub use error::{DiscoveryError, DiscoveryResult, InstantiationFailure};
pub use policy::{DiscoveryPolicy, DuplicatePolicy, ErrorPolicy};
pub use typed::{Provider, ServiceLoader};
