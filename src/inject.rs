use core::{
    any::type_name,
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
};
use std::sync::Arc;

use crate::{
    any::{Instance, TypeInfo},
    binding::{Binding, BindingRef},
    binding_set::BindingSource,
    dependency_resolver::Param,
    errors::ResolveErrorKind,
    provider::Provider,
    Key,
};

/// Handle to the binding behind an injected slot.
pub struct Dependency<T: ?Sized> {
    binding: BindingRef,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized> Dependency<T> {
    #[inline]
    #[must_use]
    pub(crate) const fn new(binding: BindingRef) -> Self {
        Self {
            binding,
            _marker: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub(crate) const fn binding(&self) -> &BindingRef {
        &self.binding
    }
}

impl<T: ?Sized + Send + Sync + 'static> Dependency<T> {
    pub fn get(&self) -> Result<Arc<T>, ResolveErrorKind> {
        self.binding
            .instance()?
            .downcast::<T>()
            .ok_or(ResolveErrorKind::IncorrectType {
                expected: type_name::<T>(),
            })
    }
}

impl<T: ?Sized> Clone for Dependency<T> {
    fn clone(&self) -> Self {
        Self::new(self.binding.clone())
    }
}

/// Callable that looks the binding up on every [`Lazy::get`] call.
///
/// Obtained by injecting [`Key::deferred`]. It lets a singleton depend on a per-call binding
/// and breaks construction cycles between singletons.
pub struct Lazy<T: ?Sized>(Dependency<T>);

impl<T: ?Sized + Send + Sync + 'static> Lazy<T> {
    #[inline]
    pub fn get(&self) -> Result<Arc<T>, ResolveErrorKind> {
        self.0.get()
    }
}

impl<T: ?Sized> Clone for Lazy<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: ?Sized> Debug for Lazy<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Lazy").field(&type_name::<T>()).finish()
    }
}

/// Slot whose value is a [`Lazy`] over the key instead of the instance itself.
pub struct Deferred<T: ?Sized> {
    key: Key<T>,
}

impl<T: ?Sized + 'static> Key<T> {
    #[inline]
    #[must_use]
    pub fn deferred(self) -> Deferred<T> {
        Deferred { key: self }
    }
}

struct LazyProvider<T: ?Sized> {
    lazy: Lazy<T>,
}

impl<T: ?Sized + Send + Sync + 'static> Provider for LazyProvider<T> {
    #[inline]
    fn get(&self) -> Result<Instance, ResolveErrorKind> {
        Ok(Instance::new(Arc::new(self.lazy.clone())))
    }

    #[inline]
    fn type_info(&self) -> TypeInfo {
        TypeInfo::of::<Lazy<T>>()
    }
}

impl<T: ?Sized + Send + Sync + 'static> Param for Key<T> {
    type Value = Arc<T>;
    type Handle = Dependency<T>;

    #[inline]
    fn require(self, source: &mut dyn BindingSource, cause: &str) -> Result<Self::Handle, ResolveErrorKind> {
        source.require_binding(self.raw(), cause).map(Dependency::new)
    }

    #[inline]
    fn fetch(handle: &Self::Handle) -> Result<Self::Value, ResolveErrorKind> {
        handle.get()
    }
}

impl<T: ?Sized + Send + Sync + 'static> Param for Deferred<T> {
    type Value = Lazy<T>;
    type Handle = Dependency<Lazy<T>>;

    fn require(self, source: &mut dyn BindingSource, cause: &str) -> Result<Self::Handle, ResolveErrorKind> {
        let target = source.require_binding(self.key.raw(), cause)?;
        let provider = LazyProvider {
            lazy: Lazy(Dependency::<T>::new(target)),
        };

        // Synthetic binding: nothing to inject, the provider hands out the callable.
        let binding = Binding::from_provider(Arc::new(provider));
        Ok(Dependency::new(BindingRef::Bound(Arc::new(binding))))
    }

    #[inline]
    fn fetch(handle: &Self::Handle) -> Result<Self::Value, ResolveErrorKind> {
        handle.get().map(|lazy| Lazy::clone(&lazy))
    }
}
