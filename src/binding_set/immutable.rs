use parking_lot::Mutex;
use std::{collections::BTreeMap, string::ToString as _, sync::Arc, vec::Vec};
use tracing::debug;

use super::{find, insert, BindingSource, Buckets, ResolvableBindingSet};
use crate::{
    any::TypeInfo,
    binding::{Binding, BindingRef},
    errors::ResolveErrorKind,
    key::{BindingKey, MappedKey},
    point::ListPoint,
};

/// Bindings used by the injector at runtime.
///
/// Every lookup, including creation of automatic bindings and member points, runs under one lock.
pub(crate) struct ImmutableBindingSet {
    state: Mutex<State>,
}

struct State {
    buckets: Buckets,
    /// Introspected points of types whose binding doesn't carry one.
    points: BTreeMap<TypeInfo, Arc<ListPoint>>,
}

impl From<ResolvableBindingSet> for ImmutableBindingSet {
    fn from(bindings: ResolvableBindingSet) -> Self {
        Self {
            state: Mutex::new(State {
                buckets: bindings.into_buckets(),
                points: BTreeMap::new(),
            }),
        }
    }
}

impl ImmutableBindingSet {
    #[must_use]
    pub(crate) fn get_binding(&self, key: &BindingKey) -> Option<BindingRef> {
        let state = self.state.lock();
        find(&state.buckets, key).map(|entry| entry.binding.clone())
    }

    /// Returns the binding for the key, creating it with `synthesize` if there is none.
    ///
    /// `synthesize` runs under the lock and sees the existing bindings through a source
    /// that fails on missing keys instead of creating placeholders.
    pub(crate) fn require_binding<F>(&self, key: &BindingKey, synthesize: F) -> Result<BindingRef, ResolveErrorKind>
    where
        F: FnOnce(&mut dyn BindingSource) -> Result<Arc<Binding>, ResolveErrorKind>,
    {
        let mut state = self.state.lock();
        if let Some(entry) = find(&state.buckets, key) {
            return Ok(entry.binding.clone());
        }

        let binding = synthesize(&mut FrozenSource { buckets: &state.buckets })?;
        insert(
            &mut state.buckets,
            MappedKey::new(key.clone(), None),
            BindingRef::Bound(binding.clone()),
        );
        debug!(%key, "Automatic binding created");

        Ok(BindingRef::Bound(binding))
    }

    /// Returns the member point of a type, creating it with `introspect` on first use.
    ///
    /// `introspect` sees the bindings the same way as in [`Self::require_binding`]. A failure isn't memoized.
    pub(crate) fn require_point<F>(&self, type_info: TypeInfo, introspect: F) -> Result<Arc<ListPoint>, ResolveErrorKind>
    where
        F: FnOnce(&mut dyn BindingSource) -> Result<Arc<ListPoint>, ResolveErrorKind>,
    {
        let mut state = self.state.lock();
        if let Some(point) = state.points.get(&type_info) {
            return Ok(point.clone());
        }

        let point = introspect(&mut FrozenSource { buckets: &state.buckets })?;
        state.points.insert(type_info, point.clone());
        debug!(type_name = type_info.name, "Member point created");

        Ok(point)
    }

    /// Snapshot of every binding, placeholders included.
    #[must_use]
    pub(crate) fn bindings(&self) -> Vec<BindingRef> {
        self.state
            .lock()
            .buckets
            .values()
            .flatten()
            .map(|entry| entry.binding.clone())
            .collect()
    }
}

struct FrozenSource<'a> {
    buckets: &'a Buckets,
}

impl BindingSource for FrozenSource<'_> {
    fn require_binding(&mut self, key: &BindingKey, _cause: &str) -> Result<BindingRef, ResolveErrorKind> {
        find(self.buckets, key)
            .map(|entry| entry.binding.clone())
            .ok_or_else(|| ResolveErrorKind::NoSuchBinding { key: key.to_string() })
    }
}
