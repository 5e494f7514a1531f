use std::{string::ToString as _, sync::Arc};
use tracing::debug;

use super::{Buckets, Entry, MutableBindingSet};
use crate::{
    binding::{Binding, BindingProxy, BindingRef},
    errors::BuildErrorKind,
    key::is_matching,
};

/// Bindings of all modules, frozen for resolution of placeholders.
pub(crate) struct ResolvableBindingSet {
    buckets: Buckets,
}

impl From<MutableBindingSet> for ResolvableBindingSet {
    fn from(bindings: MutableBindingSet) -> Self {
        Self {
            buckets: bindings.into_buckets(),
        }
    }
}

impl ResolvableBindingSet {
    /// Points every placeholder to a real binding from its bucket.
    ///
    /// Passes are repeated until one makes no progress, so a placeholder may be satisfied through another
    /// placeholder regardless of bucket order. Placeholders marked as resolved later are skipped.
    pub(crate) fn resolve(&self) -> Result<(), BuildErrorKind> {
        loop {
            let mut resolved = 0_usize;
            let mut unresolved: Option<(&Entry, &BindingProxy)> = None;

            for entries in self.buckets.values() {
                for entry in entries {
                    let BindingRef::Proxy(proxy) = &entry.binding else {
                        continue;
                    };
                    if proxy.is_resolved() || proxy.is_resolved_later() {
                        continue;
                    }

                    match find_real_binding(entries, entry) {
                        Some(binding) => {
                            proxy.set_binding(binding);
                            resolved += 1;
                            debug!(key = %entry.key.key, "Placeholder resolved");
                        }
                        None => {
                            unresolved.get_or_insert((entry, proxy.as_ref()));
                        }
                    }
                }
            }

            match unresolved {
                None => return Ok(()),
                Some((entry, proxy)) if resolved == 0 => {
                    return Err(BuildErrorKind::Unresolved {
                        key: entry.key.key.to_string(),
                        cause: proxy.cause().to_string(),
                    });
                }
                Some(_) => debug!(resolved, "Resolution pass made progress, repeating"),
            }
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn into_buckets(self) -> Buckets {
        self.buckets
    }
}

/// Looks for another entry in the bucket that matches the placeholder's key and is already backed by a real binding.
fn find_real_binding(entries: &[Entry], placeholder: &Entry) -> Option<Arc<Binding>> {
    entries
        .iter()
        .filter(|entry| !entry.binding.ptr_eq(&placeholder.binding))
        .filter(|entry| is_matching(&placeholder.key.key, &entry.key))
        .find_map(|entry| match &entry.binding {
            BindingRef::Bound(binding) => Some(binding.clone()),
            BindingRef::Proxy(proxy) => proxy.delegate().cloned(),
        })
}
