//! In-process contract and provider constructor registry.
//!
//! # Responsibility
//! - Hold every declared contract together with the boxed trait-object type
//!   its providers must produce.
//! - Map provider identifiers to zero-argument constructors.
//! - Collect link-time registrations submitted through `inventory`.
//!
//! # Invariants
//! - Contract and provider identifiers are validated before insertion.
//! - One provider id maps to exactly one constructor.
//! - Constructors return instances erased as `Box<dyn Any>` wrapping
//!   `Box<dyn Contract>`; type checks happen in the discovery engine.

use crate::contract::id::{ContractId, IdentifierError, ProviderId};
use log::debug;
use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use thiserror::Error;

/// Declares a trait-object type as a discoverable contract.
///
/// Implemented for `dyn Trait` types, usually through
/// [`declare_contract!`](crate::declare_contract).
pub trait Contract: 'static {
    /// Fully-qualified contract identifier used as the manifest file name.
    const NAME: &'static str;
}

/// Type-erased provider instance as returned by constructors.
pub type ErasedInstance = Box<dyn Any>;

/// Zero-argument provider constructor.
pub type Constructor = fn() -> Result<ErasedInstance, String>;

/// Erases one contract instance for storage in a constructor result.
pub fn erase<C: Contract + ?Sized>(instance: Box<C>) -> ErasedInstance {
    Box::new(instance)
}

/// Declaration record for one contract.
#[derive(Debug, Clone, Copy)]
pub struct ContractEntry {
    name: &'static str,
    type_name: fn() -> &'static str,
    instance_type: fn() -> TypeId,
}

impl ContractEntry {
    /// Builds the declaration for contract type `C`.
    pub const fn of<C: Contract + ?Sized>() -> Self {
        Self {
            name: C::NAME,
            type_name: std::any::type_name::<C>,
            instance_type: TypeId::of::<Box<C>>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Rust type name of the contract trait object, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    /// Returns whether `instance` holds a `Box<C>` for this contract.
    pub fn accepts(&self, instance: &dyn Any) -> bool {
        instance.type_id() == (self.instance_type)()
    }
}

/// Constructor record for one provider.
#[derive(Debug, Clone, Copy)]
pub struct ProviderEntry {
    contract: &'static str,
    provider: &'static str,
    origin: &'static str,
    construct: Constructor,
}

impl ProviderEntry {
    /// Creates a provider record.
    ///
    /// `origin` is the module path that registered the provider; generated
    /// manifest roots are grouped by it.
    pub const fn new(
        contract: &'static str,
        provider: &'static str,
        origin: &'static str,
        construct: Constructor,
    ) -> Self {
        Self {
            contract,
            provider,
            origin,
            construct,
        }
    }

    pub fn contract(&self) -> &'static str {
        self.contract
    }

    pub fn provider(&self) -> &'static str {
        self.provider
    }

    pub fn origin(&self) -> &'static str {
        self.origin
    }

    /// Runs the constructor once.
    pub fn construct(&self) -> Result<ErasedInstance, String> {
        (self.construct)()
    }
}

inventory::collect!(ContractEntry);
inventory::collect!(ProviderEntry);

/// How one provider reached the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationSource {
    /// Registered explicitly through [`ProviderRegistry::register`].
    Manual,
    /// Collected from link-time `inventory` submissions.
    Collected,
}

/// Registered provider snapshot.
#[derive(Debug, Clone, Copy)]
pub struct RegisteredProvider {
    pub entry: ProviderEntry,
    pub source: RegistrationSource,
}

/// Registration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("contract id is invalid: {value}: {reason}")]
    InvalidContractId {
        value: String,
        reason: IdentifierError,
    },
    #[error("provider id is invalid: {value}: {reason}")]
    InvalidProviderId {
        value: String,
        reason: IdentifierError,
    },
    #[error("contract already declared: {0}")]
    DuplicateContract(String),
    #[error("provider id already registered: {0}")]
    DuplicateProvider(String),
}

/// Contract declarations plus provider constructors keyed by provider id.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    contracts: BTreeMap<ContractId, ContractEntry>,
    providers: BTreeMap<ProviderId, RegisteredProvider>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from every `inventory` submission linked into the process.
    pub fn collected() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for entry in inventory::iter::<ContractEntry> {
            registry.register_contract(*entry)?;
        }
        for entry in inventory::iter::<ProviderEntry> {
            registry.insert_provider(*entry, RegistrationSource::Collected)?;
        }
        debug!(
            "event=registry_collect module=registry status=ok contracts={} providers={}",
            registry.contracts.len(),
            registry.providers.len()
        );
        Ok(registry)
    }

    /// Declares one contract.
    pub fn register_contract(&mut self, entry: ContractEntry) -> Result<(), RegistryError> {
        let id = ContractId::parse(entry.name()).map_err(|reason| {
            RegistryError::InvalidContractId {
                value: entry.name().to_string(),
                reason,
            }
        })?;
        if self.contracts.contains_key(&id) {
            return Err(RegistryError::DuplicateContract(id.to_string()));
        }
        self.contracts.insert(id, entry);
        Ok(())
    }

    /// Declares contract type `C`.
    pub fn declare<C: Contract + ?Sized>(&mut self) -> Result<(), RegistryError> {
        self.register_contract(ContractEntry::of::<C>())
    }

    /// Registers one provider constructor by hand.
    pub fn register(&mut self, entry: ProviderEntry) -> Result<(), RegistryError> {
        self.insert_provider(entry, RegistrationSource::Manual)
    }

    fn insert_provider(
        &mut self,
        entry: ProviderEntry,
        source: RegistrationSource,
    ) -> Result<(), RegistryError> {
        ContractId::parse(entry.contract()).map_err(|reason| RegistryError::InvalidContractId {
            value: entry.contract().to_string(),
            reason,
        })?;
        let id = ProviderId::parse(entry.provider()).map_err(|reason| {
            RegistryError::InvalidProviderId {
                value: entry.provider().to_string(),
                reason,
            }
        })?;
        if self.providers.contains_key(&id) {
            return Err(RegistryError::DuplicateProvider(id.to_string()));
        }
        self.providers
            .insert(id, RegisteredProvider { entry, source });
        Ok(())
    }

    pub fn contract(&self, id: &ContractId) -> Option<&ContractEntry> {
        self.contracts.get(id)
    }

    pub fn provider(&self, id: &ProviderId) -> Option<&RegisteredProvider> {
        self.providers.get(id)
    }

    /// Returns declared contract ids in sorted order.
    pub fn contract_ids(&self) -> Vec<ContractId> {
        self.contracts.keys().cloned().collect()
    }

    /// Returns registered providers in provider id order.
    pub fn providers(&self) -> impl Iterator<Item = (&ProviderId, &RegisteredProvider)> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
