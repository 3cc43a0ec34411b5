//! Demo contracts and providers exercised by the CLI.
//!
//! # Responsibility
//! - Declare `example.Service` (manual path) and `example.AutoService`
//!   (automatic path).
//! - Register the manual provider by hand; the automatic providers submit
//!   themselves from two separate modules, one generated root each.

mod auto_alpha;
mod auto_beta;
mod manual;

use spiloader_core::{
    declare_contract, Contract, ProviderInstance, ProviderRegistry, RegistryError,
};
use std::path::PathBuf;

/// Contract whose manifest is written by hand under `resources/manual`.
pub trait ManualService {
    fn describe(&self) -> String;
}

declare_contract!(dyn ManualService, "example.Service");

/// Contract whose manifests are generated from link-time registrations.
pub trait AutoService {
    fn describe(&self) -> String;
}

declare_contract!(dyn AutoService, "example.AutoService");

pub const MANUAL_CONTRACT: &str = <dyn ManualService as Contract>::NAME;
pub const AUTO_CONTRACT: &str = <dyn AutoService as Contract>::NAME;

/// Expected provider counts checked by `spiloader verify`.
pub const DEFAULT_EXPECTATIONS: &[(&str, usize)] = &[(MANUAL_CONTRACT, 1), (AUTO_CONTRACT, 2)];

/// Directory root holding the hand-written manifest.
pub fn default_manual_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("resources")
        .join("manual")
}

/// Registers providers whose manifests are maintained by hand.
pub fn register_manual(registry: &mut ProviderRegistry) -> Result<(), RegistryError> {
    registry.register(manual::entry())
}

/// Describes an instance of one of the demo contracts, if it is one.
pub fn describe(instance: ProviderInstance) -> Option<String> {
    let instance = match instance.downcast::<dyn ManualService>() {
        Ok(provider) => return Some(provider.describe()),
        Err(instance) => instance,
    };
    instance
        .downcast::<dyn AutoService>()
        .ok()
        .map(|provider| provider.describe())
}
