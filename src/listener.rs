use std::{sync::Arc, vec::Vec};

use crate::{
    any::{Instance, TypeInfo},
    key::BindingKey,
    point::InjectionPoint,
    Injector,
};

/// Called once for every freshly constructed instance, in construction order.
pub trait InjectionListener: Send + Sync {
    fn initialized(&self, key: &BindingKey, instance: &Instance);
}

impl<F> InjectionListener for F
where
    F: Fn(&BindingKey, &Instance) + Send + Sync,
{
    #[inline]
    fn initialized(&self, key: &BindingKey, instance: &Instance) {
        self(key, instance);
    }
}

/// Called once after the injector is fully built.
pub trait InjectorBuildListener {
    fn created(&self, injector: &Injector);
}

impl<F> InjectorBuildListener for F
where
    F: Fn(&Injector),
{
    #[inline]
    fn created(&self, injector: &Injector) {
        self(injector);
    }
}

/// Contributes extra injection points for every introspected type.
/// The points are applied after the type's own fields and methods.
pub trait InjectionParticipator: Send + Sync {
    fn points(&self, key: &BindingKey, type_info: TypeInfo) -> Vec<Arc<dyn InjectionPoint>>;
}

impl<F> InjectionParticipator for F
where
    F: Fn(&BindingKey, TypeInfo) -> Vec<Arc<dyn InjectionPoint>> + Send + Sync,
{
    #[inline]
    fn points(&self, key: &BindingKey, type_info: TypeInfo) -> Vec<Arc<dyn InjectionPoint>> {
        self(key, type_info)
    }
}

pub(crate) type InjectionListeners = Arc<[Arc<dyn InjectionListener>]>;
pub(crate) type InjectionParticipators = Arc<[Arc<dyn InjectionParticipator>]>;

/// Reports constructed instances of one key to the injection listeners.
#[derive(Clone)]
pub(crate) struct Notifier {
    key: BindingKey,
    listeners: InjectionListeners,
}

impl Notifier {
    #[inline]
    #[must_use]
    pub(crate) fn new(key: BindingKey, listeners: InjectionListeners) -> Self {
        Self { key, listeners }
    }

    pub(crate) fn notify(&self, instance: &Instance) {
        for listener in self.listeners.iter() {
            listener.initialized(&self.key, instance);
        }
    }
}
