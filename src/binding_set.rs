mod immutable;
mod mutable;
mod resolvable;

use std::{collections::BTreeMap, vec::Vec};
use tracing::warn;

pub(crate) use immutable::ImmutableBindingSet;
pub(crate) use mutable::MutableBindingSet;
pub(crate) use resolvable::ResolvableBindingSet;

use crate::{
    binding::BindingRef,
    errors::ResolveErrorKind,
    key::{is_matching, BindingKey, MappedKey, ReducedKey},
};

/// Where the dependencies of a type are looked up while it's being introspected.
pub trait BindingSource {
    /// Returns the binding matching the key.
    /// Sources used while the injector is being configured create a placeholder instead of failing.
    fn require_binding(&mut self, key: &BindingKey, cause: &str) -> Result<BindingRef, ResolveErrorKind>;
}

#[derive(Clone)]
pub(crate) struct Entry {
    pub(crate) key: MappedKey,
    pub(crate) binding: BindingRef,
}

/// Bindings grouped by type and name. Entries of a bucket keep insertion order.
pub(crate) type Buckets = BTreeMap<ReducedKey, Vec<Entry>>;

/// Finds the first entry matching the key in its bucket.
pub(crate) fn find<'a>(buckets: &'a Buckets, key: &BindingKey) -> Option<&'a Entry> {
    let bucket = buckets.get(&ReducedKey::from(key))?;
    let entry = bucket.iter().find(|entry| is_matching(key, &entry.key))?;

    if bucket
        .iter()
        .filter(|entry| entry.binding.is_bound() && is_matching(key, &entry.key))
        .nth(1)
        .is_some()
    {
        warn!(%key, "Several bindings match the key, the first one is used");
    }

    Some(entry)
}

pub(crate) fn insert(buckets: &mut Buckets, key: MappedKey, binding: BindingRef) {
    buckets
        .entry(ReducedKey::from(&key.key))
        .or_default()
        .push(Entry { key, binding });
}
