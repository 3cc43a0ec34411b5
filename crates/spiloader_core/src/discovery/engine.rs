//! Discovery engine: contract id to lazily constructed provider instances.
//!
//! # Responsibility
//! - Walk injected search roots in order and read one manifest per root.
//! - Apply malformed-line, instantiation and duplicate policies.
//! - Construct providers and check them against the contract type.
//!
//! # Invariants
//! - Roots are visited in construction order; the engine never sorts them.
//! - A root's manifest is read only after every entry of the previous root
//!   has been yielded or skipped.
//! - Under fail-fast, a malformed line rejects its whole manifest before any
//!   provider of that manifest is constructed. Providers yielded from earlier
//!   roots stay yielded.
//! - After the first error the iterator is exhausted.
//! - A panicking constructor counts as an instantiation failure.
//! - Nothing is cached between calls.

use crate::contract::id::{ContractId, ProviderId};
use crate::contract::registry::{Contract, ContractEntry, ErasedInstance, ProviderRegistry};
use crate::discovery::error::{DiscoveryError, DiscoveryResult, InstantiationFailure};
use crate::discovery::policy::{DiscoveryPolicy, DuplicatePolicy, ErrorPolicy};
use crate::discovery::typed::{Provider, ServiceLoader};
use crate::logging::panic_message;
use crate::manifest::{parse_manifest, ManifestEntry};
use crate::root::SearchRoot;
use log::{debug, error, info, warn};
use std::collections::{HashSet, VecDeque};
use std::iter::FusedIterator;
use std::panic::{self, AssertUnwindSafe};

/// Resolves contracts to provider instances across ordered search roots.
pub struct DiscoveryEngine {
    registry: ProviderRegistry,
    roots: Vec<Box<dyn SearchRoot>>,
    policy: DiscoveryPolicy,
}

/// One provider id resolved from a manifest, without construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedProvider {
    pub provider: ProviderId,
    pub root: String,
    pub line: usize,
}

impl DiscoveryEngine {
    /// Creates an engine with the default (fail-fast, preserve) policy.
    pub fn new(registry: ProviderRegistry, roots: Vec<Box<dyn SearchRoot>>) -> Self {
        Self {
            registry,
            roots,
            policy: DiscoveryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DiscoveryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> DiscoveryPolicy {
        self.policy
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Returns root names in visiting order.
    pub fn root_names(&self) -> Vec<&str> {
        self.roots.iter().map(|root| root.name()).collect()
    }

    /// Starts discovery of every provider of the contract named `contract`.
    ///
    /// # Errors
    /// - `ContractNotFound` when the id is not a declared contract.
    ///
    /// Every other failure is yielded by the returned iterator.
    pub fn discover(&self, contract: &str) -> DiscoveryResult<Discovery<'_>> {
        let (id, entry) = self.resolve_contract(contract)?;
        Ok(Discovery::new(self, id, entry))
    }

    /// Starts typed discovery for contract type `C`.
    ///
    /// The contract does not need to be declared in the registry; the type
    /// carries its own declaration.
    pub fn load<C: Contract + ?Sized>(&self) -> DiscoveryResult<ServiceLoader<'_, C>> {
        let id = ContractId::parse(C::NAME).map_err(|_| DiscoveryError::ContractNotFound {
            contract: C::NAME.to_string(),
        })?;
        Ok(ServiceLoader::new(Discovery::new(
            self,
            id,
            ContractEntry::of::<C>(),
        )))
    }

    /// Returns the first provider of `C` that can be constructed, if any.
    pub fn find_first<C: Contract + ?Sized>(&self) -> DiscoveryResult<Option<Provider<C>>> {
        self.load::<C>()?.next().transpose()
    }

    /// Lists provider ids for `contract` in yield order without constructing them.
    ///
    /// Malformed-line and duplicate policies apply exactly as in
    /// [`DiscoveryEngine::discover`].
    pub fn provider_ids(&self, contract: &str) -> DiscoveryResult<Vec<ListedProvider>> {
        let (id, _) = self.resolve_contract(contract)?;
        let mut listed = Vec::new();
        for index in 0..self.roots.len() {
            let (entries, _) = self.read_root(&id, index)?;
            let root = self.roots[index].name();
            listed.extend(entries.into_iter().map(|entry| ListedProvider {
                provider: entry.provider,
                root: root.to_string(),
                line: entry.line,
            }));
        }
        Ok(listed)
    }

    fn resolve_contract(&self, contract: &str) -> DiscoveryResult<(ContractId, ContractEntry)> {
        let not_found = || DiscoveryError::ContractNotFound {
            contract: contract.trim().to_string(),
        };
        let id = ContractId::parse(contract).map_err(|_| not_found())?;
        let entry = *self.registry.contract(&id).ok_or_else(not_found)?;
        Ok((id, entry))
    }

    /// Reads and parses the manifest of one root.
    ///
    /// Returns the retained entries and the number of skipped malformed lines.
    fn read_root(
        &self,
        contract: &ContractId,
        index: usize,
    ) -> DiscoveryResult<(Vec<ManifestEntry>, usize)> {
        let root = &self.roots[index];
        let content = match root.read_manifest(contract) {
            Ok(Some(content)) => content,
            Ok(None) => {
                debug!(
                    "event=manifest_read module=discovery status=absent contract={} root={}",
                    contract,
                    root.name()
                );
                return Ok((Vec::new(), 0));
            }
            Err(source) => {
                return Err(DiscoveryError::ManifestRead {
                    contract: contract.to_string(),
                    root: root.name().to_string(),
                    source,
                });
            }
        };

        let mut entries = Vec::new();
        let mut skipped = 0;
        for outcome in parse_manifest(&content) {
            match outcome {
                Ok(entry) => entries.push(entry),
                Err(malformed) => {
                    let err = DiscoveryError::MalformedManifest {
                        contract: contract.to_string(),
                        root: root.name().to_string(),
                        line: malformed.line,
                        content: malformed.content,
                        reason: malformed.reason,
                    };
                    match self.policy.on_malformed {
                        ErrorPolicy::FailFast => return Err(err),
                        ErrorPolicy::Skip => {
                            warn!(
                                "event=manifest_line module=discovery status=skip error_code={} error={}",
                                err.code(),
                                err
                            );
                            skipped += 1;
                        }
                    }
                }
            }
        }

        let entries = apply_duplicate_policy(entries, self.policy.duplicates);
        debug!(
            "event=manifest_read module=discovery status=ok contract={} root={} entries={} skipped={}",
            contract,
            root.name(),
            entries.len(),
            skipped
        );
        Ok((entries, skipped))
    }

    fn instantiate(
        &self,
        contract: &ContractId,
        expected: &ContractEntry,
        provider: &ProviderId,
    ) -> DiscoveryResult<ErasedInstance> {
        let instantiation_error = |reason| DiscoveryError::ProviderInstantiation {
            contract: contract.to_string(),
            provider: provider.to_string(),
            reason,
        };
        let registered = self
            .registry
            .provider(provider)
            .ok_or_else(|| instantiation_error(InstantiationFailure::NotRegistered))?;
        let constructed = panic::catch_unwind(AssertUnwindSafe(|| registered.entry.construct()))
            .unwrap_or_else(|payload| {
                Err(format!(
                    "constructor panicked: {}",
                    panic_message(payload.as_ref())
                ))
            });
        let instance = constructed
            .map_err(|message| instantiation_error(InstantiationFailure::Constructor(message)))?;

        if !expected.accepts(instance.as_ref()) {
            return Err(DiscoveryError::ProviderTypeMismatch {
                contract: contract.to_string(),
                provider: provider.to_string(),
                expected: expected.type_name(),
            });
        }
        Ok(instance)
    }
}

fn apply_duplicate_policy(
    entries: Vec<ManifestEntry>,
    policy: DuplicatePolicy,
) -> Vec<ManifestEntry> {
    match policy {
        DuplicatePolicy::Preserve => entries,
        DuplicatePolicy::CollapseConsecutive => {
            let mut kept: Vec<ManifestEntry> = Vec::with_capacity(entries.len());
            for entry in entries {
                if kept
                    .last()
                    .is_some_and(|previous| previous.provider == entry.provider)
                {
                    continue;
                }
                kept.push(entry);
            }
            kept
        }
        DuplicatePolicy::UniquePerRoot => {
            let mut seen = HashSet::new();
            entries
                .into_iter()
                .filter(|entry| seen.insert(entry.provider.clone()))
                .collect()
        }
    }
}

/// Type-erased provider instance yielded by [`Discovery`].
#[derive(Debug)]
pub struct ProviderInstance {
    provider: ProviderId,
    root: String,
    instance: ErasedInstance,
}

impl ProviderInstance {
    pub fn provider(&self) -> &ProviderId {
        &self.provider
    }

    /// Name of the root whose manifest listed this provider.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Recovers the typed instance; returns `self` unchanged on type mismatch.
    pub fn downcast<C: Contract + ?Sized>(self) -> Result<Provider<C>, Self> {
        let Self {
            provider,
            root,
            instance,
        } = self;
        match instance.downcast::<Box<C>>() {
            Ok(typed) => Ok(Provider::new(provider, root, *typed)),
            Err(instance) => Err(Self {
                provider,
                root,
                instance,
            }),
        }
    }
}

struct PendingProvider {
    root: usize,
    entry: ManifestEntry,
}

/// Lazy, single-pass sequence of providers for one contract.
///
/// Created by [`DiscoveryEngine::discover`]. Each `next` call advances an
/// internal cursor over roots and manifest entries; it is not meant to be
/// shared between threads.
pub struct Discovery<'a> {
    engine: &'a DiscoveryEngine,
    contract: ContractId,
    expected: ContractEntry,
    next_root: usize,
    pending: VecDeque<PendingProvider>,
    yielded: usize,
    skipped: usize,
    done: bool,
}

impl<'a> Discovery<'a> {
    fn new(engine: &'a DiscoveryEngine, contract: ContractId, expected: ContractEntry) -> Self {
        debug!(
            "event=discover module=discovery status=start contract={} roots={} on_malformed={} on_instantiation_error={} duplicates={}",
            contract,
            engine.roots.len(),
            engine.policy.on_malformed,
            engine.policy.on_instantiation_error,
            engine.policy.duplicates
        );
        Self {
            engine,
            contract,
            expected,
            next_root: 0,
            pending: VecDeque::new(),
            yielded: 0,
            skipped: 0,
            done: false,
        }
    }

    pub fn contract(&self) -> &ContractId {
        &self.contract
    }

    /// Providers yielded so far.
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    /// Malformed lines and failed constructions skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn fail(&mut self, err: DiscoveryError) -> Option<DiscoveryResult<ProviderInstance>> {
        self.done = true;
        self.pending.clear();
        error!(
            "event=discover module=discovery status=error contract={} yielded={} error_code={} error={}",
            self.contract,
            self.yielded,
            err.code(),
            err
        );
        Some(Err(err))
    }

    fn finish(&mut self) {
        self.done = true;
        info!(
            "event=discover module=discovery status=ok contract={} yielded={} skipped={}",
            self.contract, self.yielded, self.skipped
        );
    }
}

impl Iterator for Discovery<'_> {
    type Item = DiscoveryResult<ProviderInstance>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if let Some(pending) = self.pending.pop_front() {
                let provider = pending.entry.provider;
                let outcome = self
                    .engine
                    .instantiate(&self.contract, &self.expected, &provider);
                match outcome {
                    Ok(instance) => {
                        let root = self.engine.roots[pending.root].name().to_string();
                        debug!(
                            "event=provider_instantiate module=discovery status=ok contract={} provider={} root={} line={}",
                            self.contract, provider, root, pending.entry.line
                        );
                        self.yielded += 1;
                        return Some(Ok(ProviderInstance {
                            provider,
                            root,
                            instance,
                        }));
                    }
                    Err(err @ DiscoveryError::ProviderInstantiation { .. })
                        if self.engine.policy.on_instantiation_error == ErrorPolicy::Skip =>
                    {
                        warn!(
                            "event=provider_instantiate module=discovery status=skip error_code={} error={}",
                            err.code(),
                            err
                        );
                        self.skipped += 1;
                        continue;
                    }
                    Err(err) => return self.fail(err),
                }
            }

            if self.next_root >= self.engine.roots.len() {
                self.finish();
                return None;
            }

            let index = self.next_root;
            self.next_root += 1;
            match self.engine.read_root(&self.contract, index) {
                Ok((entries, skipped)) => {
                    self.skipped += skipped;
                    self.pending.extend(
                        entries
                            .into_iter()
                            .map(|entry| PendingProvider { root: index, entry }),
                    );
                }
                Err(err) => return self.fail(err),
            }
        }
    }
}

impl FusedIterator for Discovery<'_> {}
