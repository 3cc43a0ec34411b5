//! Provider manifests.
//!
//! # Responsibility
//! - Define the reserved manifest location derived from a contract id.
//! - Parse the line format and render/generate manifests.
//!
//! # Invariants
//! - The location is `<base>/META-INF/services/<contract-id>`, bit for bit,
//!   so manifests written by external tooling are found unchanged.

mod generate;
mod parse;

use crate::contract::id::ContractId;
use std::path::{Path, PathBuf};

pub use generate::{
    generated_manifests, generated_roots, render_manifest, write_manifest,
    GENERATED_ROOT_PREFIX,
};
pub use parse::{parse_manifest, MalformedLine, ManifestEntry, COMMENT_MARKER};

/// Reserved directory, relative to a root, holding manifests.
pub const SERVICES_DIR: &str = "META-INF/services";

/// Returns the manifest location for `contract` below `base`.
pub fn manifest_path(base: &Path, contract: &ContractId) -> PathBuf {
    let mut path = base.to_path_buf();
    for segment in SERVICES_DIR.split('/') {
        path.push(segment);
    }
    path.push(contract.as_str());
    path
}
