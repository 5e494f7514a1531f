use core::any::type_name;
use std::sync::{Arc, Weak};
use tracing::debug;

use crate::{
    any::{Instance, TypeInfo},
    errors::ResolveErrorKind,
    injector::InjectorInner,
    introspector::Recipe,
    listener::Notifier,
    point::InjectionPoint as _,
    service::{service_fn, BoxService},
    Injector,
};

/// Zero-argument factory of instances of a key, already wrapped with a scope.
pub trait Provider: Send + Sync {
    fn get(&self) -> Result<Instance, ResolveErrorKind>;

    fn type_info(&self) -> TypeInfo;

    /// Optional capability of providers that resolve their dependencies through the injector.
    #[inline]
    fn injector_aware(&self) -> Option<&dyn InjectorAware> {
        None
    }
}

pub trait InjectorAware {
    fn init(&self, injector: &Injector);
}

/// Provider without a scope: builds an instance and applies its points every time it's called.
pub(crate) type BoxedBaseProvider = BoxService<Injector, Instance, ResolveErrorKind>;

#[must_use]
pub(crate) fn boxed_constructor_provider<S, T, C>(recipe: Recipe<S>, cast: C, notifier: Notifier) -> BoxedBaseProvider
where
    S: Send + Sync + 'static,
    T: ?Sized + Send + Sync + 'static,
    C: Fn(Arc<S>) -> Arc<T> + Send + Sync + 'static,
{
    let Recipe { constructor, point } = recipe;

    BoxService::new(service_fn(move |injector: Injector| {
        let Some(constructor) = &constructor else {
            return Err(ResolveErrorKind::NotInstantiable {
                type_name: type_name::<S>(),
            });
        };

        let mut instance = constructor()?;
        point.inject_to(&mut instance, &injector)?;

        let instance = Instance::new(cast(Arc::new(instance)));
        debug!(implementation = type_name::<S>(), "Constructed");

        notifier.notify(&instance);
        Ok(instance)
    }))
}

#[must_use]
pub(crate) fn boxed_fn_provider<T, F>(factory: F, notifier: Notifier) -> BoxedBaseProvider
where
    T: ?Sized + Send + Sync + 'static,
    F: Fn() -> Result<Arc<T>, ResolveErrorKind> + Send + Sync + 'static,
{
    BoxService::new(service_fn(move |_injector: Injector| {
        let instance = Instance::new(factory()?);
        debug!("Provided");

        notifier.notify(&instance);
        Ok(instance)
    }))
}

/// Provider behind the automatic binding of the injector to itself.
pub(crate) struct InjectorProvider {
    injector: Weak<InjectorInner>,
}

impl InjectorProvider {
    #[inline]
    #[must_use]
    pub(crate) fn new(injector: &Injector) -> Self {
        Self {
            injector: injector.downgrade(),
        }
    }
}

impl Provider for InjectorProvider {
    fn get(&self) -> Result<Instance, ResolveErrorKind> {
        Injector::upgrade(&self.injector)
            .map(|injector| Instance::new(Arc::new(injector)))
            .ok_or(ResolveErrorKind::Uninitialized {
                type_name: type_name::<Injector>(),
            })
    }

    #[inline]
    fn type_info(&self) -> TypeInfo {
        TypeInfo::of::<Injector>()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::Provider;
    use crate::{
        any::{Instance, TypeInfo},
        errors::ResolveErrorKind,
    };

    pub(crate) struct ValueProvider(pub(crate) Instance);

    impl Provider for ValueProvider {
        fn get(&self) -> Result<Instance, ResolveErrorKind> {
            Ok(self.0.clone())
        }

        fn type_info(&self) -> TypeInfo {
            self.0.type_info()
        }
    }
}
