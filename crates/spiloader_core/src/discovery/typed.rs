//! Typed view over discovery for one contract type.

use crate::contract::id::ProviderId;
use crate::contract::registry::Contract;
use crate::discovery::engine::Discovery;
use crate::discovery::error::{DiscoveryError, DiscoveryResult};
use std::fmt::{Debug, Formatter};
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ops::Deref;

/// Provider instance of contract `C` with its origin.
pub struct Provider<C: ?Sized> {
    id: ProviderId,
    root: String,
    instance: Box<C>,
}

impl<C: ?Sized> Provider<C> {
    pub(crate) fn new(id: ProviderId, root: String, instance: Box<C>) -> Self {
        Self { id, root, instance }
    }

    pub fn id(&self) -> &ProviderId {
        &self.id
    }

    /// Name of the root whose manifest listed this provider.
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn into_inner(self) -> Box<C> {
        self.instance
    }
}

impl<C: ?Sized> Deref for Provider<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.instance
    }
}

impl<C: ?Sized> Debug for Provider<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("id", &self.id)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

/// Lazy sequence of `Provider<C>`, created by
/// [`DiscoveryEngine::load`](crate::DiscoveryEngine::load).
pub struct ServiceLoader<'a, C: ?Sized> {
    inner: Discovery<'a>,
    failed: bool,
    _contract: PhantomData<fn() -> Box<C>>,
}

impl<'a, C: Contract + ?Sized> ServiceLoader<'a, C> {
    pub(crate) fn new(inner: Discovery<'a>) -> Self {
        Self {
            inner,
            failed: false,
            _contract: PhantomData,
        }
    }

    /// Providers yielded so far.
    pub fn yielded(&self) -> usize {
        self.inner.yielded()
    }
}

impl<C: Contract + ?Sized> Iterator for ServiceLoader<'_, C> {
    type Item = DiscoveryResult<Provider<C>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let outcome = self.inner.next()?.and_then(|instance| {
            instance
                .downcast::<C>()
                .map_err(|instance| DiscoveryError::ProviderTypeMismatch {
                    contract: C::NAME.to_string(),
                    provider: instance.provider().to_string(),
                    expected: std::any::type_name::<C>(),
                })
        });
        if outcome.is_err() {
            self.failed = true;
        }
        Some(outcome)
    }
}

impl<C: Contract + ?Sized> FusedIterator for ServiceLoader<'_, C> {}
