//! Manifest search roots.
//!
//! # Responsibility
//! - Abstract one search location that may hold a manifest per contract.
//! - Provide filesystem and in-memory implementations.
//!
//! # Invariants
//! - A missing manifest is `Ok(None)`, never an error.
//! - Root order is owned by the caller; nothing here sorts roots.

use crate::contract::id::ContractId;
use crate::manifest::manifest_path;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

/// Manifests larger than this are rejected.
pub const MAX_MANIFEST_BYTES: u64 = 1024 * 1024;

/// One location that may contribute a manifest for a contract.
pub trait SearchRoot {
    /// Human-readable root name used in diagnostics.
    fn name(&self) -> &str;

    /// Reads the manifest for `contract`, or `None` when this root has none.
    fn read_manifest(&self, contract: &ContractId) -> io::Result<Option<String>>;
}

/// Filesystem directory root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRoot {
    dir: PathBuf,
    name: String,
}

impl DirectoryRoot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let name = dir.display().to_string();
        Self { dir, name }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SearchRoot for DirectoryRoot {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_manifest(&self, contract: &ContractId) -> io::Result<Option<String>> {
        let path = manifest_path(&self.dir, contract);
        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("manifest path is not a file: {}", path.display()),
            ));
        }
        if metadata.len() > MAX_MANIFEST_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "manifest too large ({} bytes, max {MAX_MANIFEST_BYTES}): {}",
                    metadata.len(),
                    path.display()
                ),
            ));
        }

        // `read_to_string` reports non-UTF-8 content as `InvalidData`.
        std::fs::read_to_string(&path).map(Some)
    }
}

/// In-memory root keyed by contract id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticRoot {
    name: String,
    manifests: BTreeMap<ContractId, String>,
}

impl StaticRoot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            manifests: BTreeMap::new(),
        }
    }

    /// Adds or replaces the manifest text for `contract`.
    pub fn insert(&mut self, contract: ContractId, content: impl Into<String>) {
        self.manifests.insert(contract, content.into());
    }

    /// Builder-style [`StaticRoot::insert`].
    pub fn with_manifest(mut self, contract: ContractId, content: impl Into<String>) -> Self {
        self.insert(contract, content);
        self
    }

    pub fn contracts(&self) -> impl Iterator<Item = &ContractId> {
        self.manifests.keys()
    }
}

impl SearchRoot for StaticRoot {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_manifest(&self, contract: &ContractId) -> io::Result<Option<String>> {
        Ok(self.manifests.get(contract).cloned())
    }
}

/// Splits a platform search path (`a:b`, `a;b` on Windows) into directory
/// roots, preserving order and ignoring empty entries.
pub fn search_path_roots(search_path: &OsStr) -> Vec<DirectoryRoot> {
    std::env::split_paths(search_path)
        .filter(|path| !path.as_os_str().is_empty())
        .map(DirectoryRoot::new)
        .collect()
}
