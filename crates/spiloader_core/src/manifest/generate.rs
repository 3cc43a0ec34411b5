//! Manifest rendering and generation from link-time registrations.
//!
//! # Responsibility
//! - Render provider lists in the manifest line format.
//! - Write manifests at the reserved path under a base directory.
//! - Build one generated root per registering module.
//!
//! # Invariants
//! - Generated roots are ordered by module path; providers inside a
//!   generated manifest are ordered by provider id.
//! - Only [`RegistrationSource::Collected`] providers are generated; manual
//!   providers are expected to have hand-written manifests.

use crate::contract::id::{ContractId, ProviderId};
use crate::contract::registry::{ProviderRegistry, RegistrationSource};
use crate::manifest::manifest_path;
use crate::root::StaticRoot;
use log::info;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// Prefix of generated root names.
pub const GENERATED_ROOT_PREFIX: &str = "generated:";

/// Renders providers as manifest text, one id per line.
pub fn render_manifest<'a>(providers: impl IntoIterator<Item = &'a ProviderId>) -> String {
    let mut out = String::new();
    for provider in providers {
        out.push_str(provider.as_str());
        out.push('\n');
    }
    out
}

/// Writes one manifest below `base` and returns its path.
///
/// Parent directories are created as needed; an existing file is replaced.
pub fn write_manifest(
    base: &Path,
    contract: &ContractId,
    providers: &[ProviderId],
) -> io::Result<PathBuf> {
    let path = manifest_path(base, contract);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, render_manifest(providers))?;
    info!(
        "event=manifest_write module=manifest status=ok contract={} providers={} path={}",
        contract,
        providers.len(),
        path.display()
    );
    Ok(path)
}

/// Groups collected providers by registering module, one root per module.
pub fn generated_manifests(
    registry: &ProviderRegistry,
) -> BTreeMap<&'static str, BTreeMap<ContractId, Vec<ProviderId>>> {
    let mut by_origin: BTreeMap<&'static str, BTreeMap<ContractId, Vec<ProviderId>>> =
        BTreeMap::new();
    for (provider, registered) in registry.providers() {
        if registered.source != RegistrationSource::Collected {
            continue;
        }
        // Registry insertion already validated the contract id.
        let Ok(contract) = ContractId::parse(registered.entry.contract()) else {
            continue;
        };
        by_origin
            .entry(registered.entry.origin())
            .or_default()
            .entry(contract)
            .or_default()
            .push(provider.clone());
    }
    by_origin
}

/// Builds in-memory roots holding the generated manifests.
pub fn generated_roots(registry: &ProviderRegistry) -> Vec<StaticRoot> {
    generated_manifests(registry)
        .into_iter()
        .map(|(origin, manifests)| {
            let mut root = StaticRoot::new(format!("{GENERATED_ROOT_PREFIX}{origin}"));
            for (contract, providers) in manifests {
                root.insert(contract, render_manifest(&providers));
            }
            root
        })
        .collect()
}
