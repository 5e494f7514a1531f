use core::fmt::{self, Display, Formatter};
use parking_lot::ReentrantMutex;
use std::sync::{Arc, OnceLock, Weak};
use tracing::debug;

use crate::{
    any::{Instance, TypeInfo},
    errors::ResolveErrorKind,
    injector::InjectorInner,
    provider::{BoxedBaseProvider, InjectorAware, Provider},
    service::Service as _,
    Injector,
};

/// Lifecycle policy of a binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    /// Every request builds a new instance.
    PerCall,
    /// The instance is built while the injector is built and shared afterwards.
    EagerSingleton,
    /// The instance is built on the first request and shared afterwards.
    LazySingleton,
}

impl Scope {
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Scope::PerCall => "per_call",
            Scope::EagerSingleton => "eager_singleton",
            Scope::LazySingleton => "lazy_singleton",
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

struct ScopedBase {
    type_info: TypeInfo,
    base: BoxedBaseProvider,
    injector: OnceLock<Weak<InjectorInner>>,
}

impl ScopedBase {
    fn new(type_info: TypeInfo, base: BoxedBaseProvider) -> Self {
        Self {
            type_info,
            base,
            injector: OnceLock::new(),
        }
    }

    fn provide(&self) -> Result<Instance, ResolveErrorKind> {
        let injector = self
            .injector
            .get()
            .and_then(Injector::upgrade)
            .ok_or(ResolveErrorKind::Uninitialized {
                type_name: self.type_info.name,
            })?;
        self.base.call(injector)
    }
}

impl InjectorAware for ScopedBase {
    fn init(&self, injector: &Injector) {
        let _ = self.injector.set(injector.downgrade());
    }
}

/// Cached instance with double-checked initialization.
///
/// Reads are lock-free once the value is set. The guard is reentrant, so a singleton that depends on itself
/// recurses instead of deadlocking.
#[derive(Default)]
struct SingletonCell {
    value: OnceLock<Instance>,
    guard: ReentrantMutex<()>,
}

impl SingletonCell {
    fn get_or_try_init(&self, init: impl FnOnce() -> Result<Instance, ResolveErrorKind>) -> Result<Instance, ResolveErrorKind> {
        if let Some(instance) = self.value.get() {
            debug!("Found in cache");
            return Ok(instance.clone());
        }

        let _guard = self.guard.lock();
        if let Some(instance) = self.value.get() {
            debug!("Found in cache after waiting");
            return Ok(instance.clone());
        }

        let instance = init()?;
        let _ = self.value.set(instance.clone());
        debug!("Cached");

        Ok(instance)
    }

    fn is_initialized(&self) -> bool {
        self.value.get().is_some()
    }
}

pub(crate) struct PerCallProvider {
    base: ScopedBase,
}

impl Provider for PerCallProvider {
    #[inline]
    fn get(&self) -> Result<Instance, ResolveErrorKind> {
        self.base.provide()
    }

    #[inline]
    fn type_info(&self) -> TypeInfo {
        self.base.type_info
    }

    #[inline]
    fn injector_aware(&self) -> Option<&dyn InjectorAware> {
        Some(&self.base)
    }
}

pub(crate) struct EagerSingletonProvider {
    base: ScopedBase,
    cell: SingletonCell,
}

impl EagerSingletonProvider {
    /// Builds the instance unless a dependent binding already did.
    pub(crate) fn initialize(&self) -> Result<(), ResolveErrorKind> {
        if self.cell.is_initialized() {
            return Ok(());
        }

        debug!(dependency = self.base.type_info.name, "Constructing eagerly");
        self.get().map(drop)
    }
}

impl Provider for EagerSingletonProvider {
    fn get(&self) -> Result<Instance, ResolveErrorKind> {
        self.cell.get_or_try_init(|| self.base.provide())
    }

    #[inline]
    fn type_info(&self) -> TypeInfo {
        self.base.type_info
    }

    #[inline]
    fn injector_aware(&self) -> Option<&dyn InjectorAware> {
        Some(&self.base)
    }
}

pub(crate) struct LazySingletonProvider {
    base: ScopedBase,
    cell: SingletonCell,
}

impl Provider for LazySingletonProvider {
    fn get(&self) -> Result<Instance, ResolveErrorKind> {
        self.cell.get_or_try_init(|| self.base.provide())
    }

    #[inline]
    fn type_info(&self) -> TypeInfo {
        self.base.type_info
    }

    #[inline]
    fn injector_aware(&self) -> Option<&dyn InjectorAware> {
        Some(&self.base)
    }
}

/// Wraps a base provider with the scope's policy.
/// Eager providers are returned separately as well, so the build can construct them in declaration order.
#[must_use]
pub(crate) fn scoped_provider(
    scope: Scope,
    type_info: TypeInfo,
    base: BoxedBaseProvider,
) -> (Arc<dyn Provider>, Option<Arc<EagerSingletonProvider>>) {
    let base = ScopedBase::new(type_info, base);
    match scope {
        Scope::PerCall => (Arc::new(PerCallProvider { base }), None),
        Scope::LazySingleton => (
            Arc::new(LazySingletonProvider {
                base,
                cell: SingletonCell::default(),
            }),
            None,
        ),
        Scope::EagerSingleton => {
            let provider = Arc::new(EagerSingletonProvider {
                base,
                cell: SingletonCell::default(),
            });
            (provider.clone(), Some(provider))
        }
    }
}
