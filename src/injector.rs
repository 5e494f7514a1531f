use core::{
    any::type_name,
    fmt::{self, Debug, Formatter},
};
use std::{
    string::ToString as _,
    sync::{Arc, Weak},
};
use tracing::{debug, error, info_span};

use crate::{
    binding::{Binding, BindingRef},
    binding_set::ImmutableBindingSet,
    config::Config,
    errors::ResolveErrorKind,
    introspector::{self, Injectable},
    key::{BindingKey, Key},
    listener::{InjectionListeners, InjectionParticipators, Notifier},
    point::{InjectionPoint as _, ListPoint},
    provider::boxed_constructor_provider,
    scope::{scoped_provider, Scope},
};

pub(crate) struct InjectorInner {
    bindings: ImmutableBindingSet,
    config: Config,
    listeners: InjectionListeners,
    participators: InjectionParticipators,
}

/// Runtime facade over the built bindings.
///
/// Cloning is cheap, clones share the same bindings and singletons.
#[derive(Clone)]
pub struct Injector {
    inner: Arc<InjectorInner>,
}

impl Injector {
    #[must_use]
    pub(crate) fn new(
        bindings: ImmutableBindingSet,
        config: Config,
        listeners: InjectionListeners,
        participators: InjectionParticipators,
    ) -> Self {
        Self {
            inner: Arc::new(InjectorInner {
                bindings,
                config,
                listeners,
                participators,
            }),
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn downgrade(&self) -> Weak<InjectorInner> {
        Arc::downgrade(&self.inner)
    }

    #[inline]
    #[must_use]
    pub(crate) fn upgrade(inner: &Weak<InjectorInner>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }

    #[inline]
    #[must_use]
    pub(crate) fn bindings(&self) -> &ImmutableBindingSet {
        &self.inner.bindings
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> Config {
        self.inner.config
    }

    /// Checks whether both handles point to the same injector.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Gets an instance of the unnamed, not annotated key of `T`.
    ///
    /// # Returns
    /// `Ok(None)` if there is no such binding.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::Instantiator`] if the instance or one of its dependencies fails to build
    #[inline]
    pub fn get_instance<T>(&self) -> Result<Option<Arc<T>>, ResolveErrorKind>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get_instance_by_key(&Key::new())
    }

    #[inline]
    pub fn get_named_instance<T>(&self, name: &str) -> Result<Option<Arc<T>>, ResolveErrorKind>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get_instance_by_key(&Key::new().named(name))
    }

    pub fn get_instance_by_key<T>(&self, key: &Key<T>) -> Result<Option<Arc<T>>, ResolveErrorKind>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let span = info_span!("get", dependency = type_name::<T>(), key = %key);
        let _guard = span.enter();

        let Some(binding) = self.inner.bindings.get_binding(key.raw()) else {
            debug!("No binding found");
            return Ok(None);
        };
        self.provide(&binding).map(Some)
    }

    /// Gets an instance of the unnamed, not annotated key of `T`.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::NoSuchBinding`] if there is no such binding
    /// - Returns [`ResolveErrorKind::Instantiator`] if the instance or one of its dependencies fails to build
    #[inline]
    pub fn require_instance<T>(&self) -> Result<Arc<T>, ResolveErrorKind>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.require_instance_by_key(&Key::new())
    }

    #[inline]
    pub fn require_named_instance<T>(&self, name: &str) -> Result<Arc<T>, ResolveErrorKind>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.require_instance_by_key(&Key::new().named(name))
    }

    pub fn require_instance_by_key<T>(&self, key: &Key<T>) -> Result<Arc<T>, ResolveErrorKind>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let span = info_span!("require", dependency = type_name::<T>(), key = %key);
        let _guard = span.enter();

        let Some(binding) = self.inner.bindings.get_binding(key.raw()) else {
            let err = ResolveErrorKind::NoSuchBinding { key: key.to_string() };
            error!("{}", err);
            return Err(err);
        };
        self.provide(&binding)
    }

    /// Applies the injection points of `T` to an instance built outside the injector.
    ///
    /// If `T` has no binding, an automatic one is created when [`Config::automatic_bindings`] is enabled.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::NoSuchBinding`] if a member's dependency has no binding
    /// - Returns [`ResolveErrorKind::Instantiator`] if a dependency fails to build or a member fails to be set
    pub fn inject_members<T: Injectable>(&self, instance: &mut T) -> Result<(), ResolveErrorKind> {
        let span = info_span!("inject_members", dependency = type_name::<T>());
        let _guard = span.enter();

        let binding = self.automatic_binding::<T>()?;
        let result = binding.binding().and_then(|binding| match binding.point() {
            Some(point) => point.inject_to(instance, self),
            None => self.member_point::<T>()?.inject_to(instance, self),
        });
        if let Err(err) = &result {
            error!("{}", err);
        }
        result
    }

    /// Builds an instance of a concrete type, using an automatic binding if `T` has none.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::NotInstantiable`] if `T` has no injection constructor
    /// - Returns [`ResolveErrorKind::Instantiator`] if the instance or one of its dependencies fails to build
    pub fn instantiate<T: Injectable>(&self) -> Result<Arc<T>, ResolveErrorKind> {
        let span = info_span!("instantiate", dependency = type_name::<T>());
        let _guard = span.enter();

        let binding = self.automatic_binding::<T>()?;
        self.provide(&binding)
    }

    fn provide<T>(&self, binding: &BindingRef) -> Result<Arc<T>, ResolveErrorKind>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let instance = match binding.instance() {
            Ok(instance) => instance,
            Err(err) => {
                error!("{}", err);
                return Err(err);
            }
        };

        match instance.downcast::<T>() {
            Some(instance) => {
                debug!("Resolved");
                Ok(instance)
            }
            None => {
                let err = ResolveErrorKind::IncorrectType {
                    expected: type_name::<T>(),
                };
                error!("{}", err);
                Err(err)
            }
        }
    }

    /// Point of `T` for bindings whose target isn't introspected, such as instances and providers.
    fn member_point<T: Injectable>(&self) -> Result<Arc<ListPoint>, ResolveErrorKind> {
        let key = BindingKey::of::<T>();
        self.inner.bindings.require_point(key.type_info(), |source| {
            let recipe = introspector::introspect::<T>(source, &self.inner.participators, &key)?;
            Ok(recipe.point)
        })
    }

    fn automatic_binding<T: Injectable>(&self) -> Result<BindingRef, ResolveErrorKind> {
        let key = BindingKey::of::<T>();
        let result = self.inner.bindings.require_binding(&key, |source| {
            if !self.inner.config.automatic_bindings {
                return Err(ResolveErrorKind::NoSuchBinding { key: key.to_string() });
            }

            let recipe = introspector::introspect::<T>(source, &self.inner.participators, &key)?;
            let point = recipe.point.clone();
            let base = boxed_constructor_provider(
                recipe,
                |instance: Arc<T>| instance,
                Notifier::new(key.clone(), self.inner.listeners.clone()),
            );

            let scope = match self.inner.config.automatic_scope {
                Scope::EagerSingleton => Scope::LazySingleton,
                scope => scope,
            };
            let (provider, _) = scoped_provider(scope, key.type_info(), base);

            let binding = Arc::new(Binding::new(provider, point));
            binding.init(self);
            Ok(binding)
        });

        if let Err(err) = &result {
            error!("{}", err);
        }
        result
    }
}

impl Debug for Injector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector").field("config", &self.inner.config).finish_non_exhaustive()
    }
}
