use std::sync::Arc;
use tracing::debug;

use super::{find, insert, BindingSource, Buckets};
use crate::{
    binding::{Binding, BindingProxy, BindingRef},
    errors::ResolveErrorKind,
    key::{is_matching, BindingKey, MappedKey, ReducedKey},
};

/// Bindings collected while modules are configured.
#[derive(Default)]
pub(crate) struct MutableBindingSet {
    buckets: Buckets,
}

impl MutableBindingSet {
    pub(crate) fn add(&mut self, key: MappedKey, binding: Arc<Binding>) {
        debug!(key = %key.key, "Binding added");
        insert(&mut self.buckets, key, BindingRef::Bound(binding));
    }

    /// First declared binding matching the key, ignoring placeholders.
    #[must_use]
    pub(crate) fn find_bound(&self, key: &BindingKey) -> Option<&Arc<Binding>> {
        self.buckets
            .get(&ReducedKey::from(key))?
            .iter()
            .filter(|entry| is_matching(key, &entry.key))
            .find_map(|entry| match &entry.binding {
                BindingRef::Bound(binding) => Some(binding),
                BindingRef::Proxy(_) => None,
            })
    }

    #[inline]
    #[must_use]
    pub(crate) fn into_buckets(self) -> Buckets {
        self.buckets
    }

    #[cfg(test)]
    pub(crate) fn proxy_causes(&self) -> std::vec::Vec<std::string::String> {
        let mut causes: std::vec::Vec<_> = self
            .buckets
            .values()
            .flatten()
            .filter_map(|entry| match &entry.binding {
                BindingRef::Proxy(proxy) => Some(proxy.cause().to_owned()),
                BindingRef::Bound(_) => None,
            })
            .collect();
        causes.sort();
        causes
    }
}

impl BindingSource for MutableBindingSet {
    /// Returns the matching binding, or a placeholder that is resolved once all modules are configured.
    fn require_binding(&mut self, key: &BindingKey, cause: &str) -> Result<BindingRef, ResolveErrorKind> {
        if let Some(entry) = find(&self.buckets, key) {
            return Ok(entry.binding.clone());
        }

        let proxy = Arc::new(BindingProxy::new(cause));
        insert(
            &mut self.buckets,
            MappedKey::new(key.clone(), None),
            BindingRef::Proxy(proxy.clone()),
        );
        debug!(%key, cause, "Placeholder binding created");

        Ok(BindingRef::Proxy(proxy))
    }
}
