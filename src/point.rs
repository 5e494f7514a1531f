use core::{
    any::{type_name, Any},
    marker::PhantomData,
};
use std::{sync::Arc, vec::Vec};
use tracing::debug;

use crate::{
    dependency_resolver::{Param, Params},
    errors::{InstantiateErrorKind, ResolveErrorKind},
    Injector,
};

/// Operation applied to a freshly constructed (or externally constructed) instance to fill its dependent members.
///
/// Implementations receive the instance as `&mut dyn Any` and are expected to downcast it to the concrete type
/// they were created for.
pub trait InjectionPoint: Send + Sync {
    fn inject_to(&self, instance: &mut dyn Any, injector: &Injector) -> Result<(), ResolveErrorKind>;
}

/// Ordered list of points, applied one after another.
#[derive(Clone, Default)]
pub struct ListPoint {
    points: Vec<Arc<dyn InjectionPoint>>,
}

impl ListPoint {
    #[inline]
    #[must_use]
    pub fn new(points: Vec<Arc<dyn InjectionPoint>>) -> Self {
        Self { points }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl InjectionPoint for ListPoint {
    fn inject_to(&self, instance: &mut dyn Any, injector: &Injector) -> Result<(), ResolveErrorKind> {
        for point in &self.points {
            point.inject_to(instance, injector)?;
        }
        Ok(())
    }
}

pub(crate) struct FieldPoint<T, P: Param, F> {
    name: &'static str,
    handle: P::Handle,
    set: F,
    _marker: PhantomData<fn(&mut T)>,
}

impl<T, P: Param, F> FieldPoint<T, P, F> {
    #[inline]
    #[must_use]
    pub(crate) const fn new(name: &'static str, handle: P::Handle, set: F) -> Self {
        Self {
            name,
            handle,
            set,
            _marker: PhantomData,
        }
    }
}

impl<T, P, F> InjectionPoint for FieldPoint<T, P, F>
where
    T: 'static,
    P: Param,
    F: Fn(&mut T, P::Value) + Send + Sync,
{
    fn inject_to(&self, instance: &mut dyn Any, _injector: &Injector) -> Result<(), ResolveErrorKind> {
        let instance = instance.downcast_mut::<T>().ok_or(ResolveErrorKind::IncorrectType {
            expected: type_name::<T>(),
        })?;
        let value = P::fetch(&self.handle).map_err(ResolveErrorKind::deps)?;
        (self.set)(instance, value);

        debug!(field = self.name, "Field injected");
        Ok(())
    }
}

pub(crate) struct MethodPoint<T, P: Params, F> {
    name: &'static str,
    handles: P::Handles,
    invoke: F,
    _marker: PhantomData<fn(&mut T)>,
}

impl<T, P: Params, F> MethodPoint<T, P, F> {
    #[inline]
    #[must_use]
    pub(crate) const fn new(name: &'static str, handles: P::Handles, invoke: F) -> Self {
        Self {
            name,
            handles,
            invoke,
            _marker: PhantomData,
        }
    }
}

impl<T, P, F> InjectionPoint for MethodPoint<T, P, F>
where
    T: 'static,
    P: Params,
    F: Fn(&mut T, P::Values) -> Result<(), InstantiateErrorKind> + Send + Sync,
{
    fn inject_to(&self, instance: &mut dyn Any, _injector: &Injector) -> Result<(), ResolveErrorKind> {
        let instance = instance.downcast_mut::<T>().ok_or(ResolveErrorKind::IncorrectType {
            expected: type_name::<T>(),
        })?;
        let values = P::fetch(&self.handles).map_err(ResolveErrorKind::deps)?;
        (self.invoke)(instance, values)?;

        debug!(method = self.name, "Method invoked");
        Ok(())
    }
}
