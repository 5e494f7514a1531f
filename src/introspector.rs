use core::any::type_name;
use std::{boxed::Box, format, sync::Arc, vec::Vec};
use tracing::{debug, warn};

use crate::{
    any::TypeInfo,
    binding_set::BindingSource,
    dependency_resolver::{Param, Params},
    errors::{InstantiateErrorKind, ResolveErrorKind},
    key::BindingKey,
    listener::InjectionParticipator,
    point::{FieldPoint, InjectionPoint, ListPoint, MethodPoint},
};

/// A concrete type the container knows how to build and populate.
///
/// `introspect` describes the injection constructor and the injectable members of the type.
/// It's called once per binding while the injector is being built, and once more for automatic bindings.
///
/// ```rust
/// use bindery::{Injectable, Key, Plan};
///
/// struct Config;
///
/// #[derive(Default)]
/// struct Service {
///     config: Option<std::sync::Arc<Config>>,
/// }
///
/// impl Injectable for Service {
///     fn introspect(plan: &mut Plan<'_, Self>) {
///         plan.default_constructor()
///             .field("config", Key::<Config>::new(), |service, config| service.config = Some(config));
///     }
/// }
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    fn introspect(plan: &mut Plan<'_, Self>);
}

pub(crate) type ConstructorFn<T> = Box<dyn Fn() -> Result<T, ResolveErrorKind> + Send + Sync>;

/// Construction plan of a type collected by [`Injectable::introspect`].
///
/// Every slot registered here is requested from the binding source immediately,
/// so missing dependencies are reported with the member that needed them.
pub struct Plan<'a, T> {
    source: &'a mut dyn BindingSource,
    constructor: Option<ConstructorFn<T>>,
    fields: Vec<Arc<dyn InjectionPoint>>,
    methods: Vec<Arc<dyn InjectionPoint>>,
    error: Option<ResolveErrorKind>,
}

impl<'a, T: Injectable> Plan<'a, T> {
    fn new(source: &'a mut dyn BindingSource) -> Self {
        Self {
            source,
            constructor: None,
            fields: Vec::new(),
            methods: Vec::new(),
            error: None,
        }
    }

    /// Marks the injection constructor. Only the first one is used.
    pub fn constructor<P, F>(&mut self, params: P, constructor: F) -> &mut Self
    where
        P: Params,
        F: Fn(P::Values) -> Result<T, InstantiateErrorKind> + Send + Sync + 'static,
    {
        if self.constructor.is_some() {
            warn!(dependency = type_name::<T>(), "Injection constructor is already marked, ignoring another one");
            return self;
        }

        let cause = format!("Required to invoke the constructor of {}", type_name::<T>());
        if let Some(handles) = self.require(params, &cause) {
            self.constructor = Some(Box::new(move || {
                let values = P::fetch(&handles).map_err(ResolveErrorKind::deps)?;
                constructor(values).map_err(Into::into)
            }));
        }
        self
    }

    /// Uses [`Default`] as the constructor.
    pub fn default_constructor(&mut self) -> &mut Self
    where
        T: Default,
    {
        self.constructor((), |()| Ok(T::default()))
    }

    /// Marks an injectable field. `set` assigns the resolved value.
    pub fn field<P, F>(&mut self, name: &'static str, param: P, set: F) -> &mut Self
    where
        P: Param,
        F: Fn(&mut T, P::Value) + Send + Sync + 'static,
    {
        let cause = format!("Required to inject to an instance of {}", type_name::<T>());
        if let Some(handle) = self.require((param,), &cause) {
            let (handle,) = handle;
            self.fields.push(Arc::new(FieldPoint::<T, P, F>::new(name, handle, set)));
        }
        self
    }

    /// Marks an injectable method. `invoke` is called with all resolved parameters.
    pub fn method<P, F>(&mut self, name: &'static str, params: P, invoke: F) -> &mut Self
    where
        P: Params,
        F: Fn(&mut T, P::Values) -> Result<(), InstantiateErrorKind> + Send + Sync + 'static,
    {
        let cause = format!("Required to invoke the method {}::{}", type_name::<T>(), name);
        if let Some(handles) = self.require(params, &cause) {
            self.methods.push(Arc::new(MethodPoint::<T, P, F>::new(name, handles, invoke)));
        }
        self
    }

    fn require<P: Params>(&mut self, params: P, cause: &str) -> Option<P::Handles> {
        if self.error.is_some() {
            return None;
        }

        match params.require(&mut *self.source, cause) {
            Ok(handles) => Some(handles),
            Err(err) => {
                self.error = Some(err);
                None
            }
        }
    }
}

/// Introspection result: an optional constructor and the ordered points of the type.
pub(crate) struct Recipe<T> {
    pub(crate) constructor: Option<ConstructorFn<T>>,
    pub(crate) point: Arc<ListPoint>,
}

impl<T> Recipe<T> {
    #[inline]
    #[must_use]
    pub(crate) const fn is_instantiable(&self) -> bool {
        self.constructor.is_some()
    }
}

/// Turns an [`Injectable`] type into a [`Recipe`]: fields first, then methods, then points of participators.
pub(crate) fn introspect<T: Injectable>(
    source: &mut dyn BindingSource,
    participators: &[Arc<dyn InjectionParticipator>],
    key: &BindingKey,
) -> Result<Recipe<T>, ResolveErrorKind> {
    let mut plan = Plan::<T>::new(source);
    T::introspect(&mut plan);

    let Plan {
        constructor,
        mut fields,
        methods,
        error,
        ..
    } = plan;
    if let Some(err) = error {
        return Err(err);
    }

    fields.extend(methods);
    for participator in participators {
        fields.extend(participator.points(key, TypeInfo::of::<T>()));
    }

    debug!(
        dependency = type_name::<T>(),
        points = fields.len(),
        instantiable = constructor.is_some(),
        "Introspected"
    );

    Ok(Recipe {
        constructor,
        point: Arc::new(ListPoint::new(fields)),
    })
}

#[cfg(test)]
mod tests {
    use core::any::Any;
    use std::sync::Arc;
    use tracing_test::traced_test;

    use super::{introspect, Injectable, Plan};
    use crate::{
        any::TypeInfo,
        binding_set::MutableBindingSet,
        errors::{InstantiateErrorKind, ResolveErrorKind},
        key::BindingKey,
        listener::InjectionParticipator,
        point::InjectionPoint,
        Injector, Key,
    };

    struct Config;
    struct Pool;

    #[derive(Default)]
    struct Repository {
        config: Option<Arc<Config>>,
        pool: Option<Arc<Pool>>,
        calls: Vec<&'static str>,
    }

    impl Injectable for Repository {
        fn introspect(plan: &mut Plan<'_, Self>) {
            plan.default_constructor()
                .method("connect", (Key::<Pool>::new(),), |repository, (pool,)| {
                    repository.pool = Some(pool);
                    repository.calls.push("connect");
                    Ok(())
                })
                .field("config", Key::<Config>::new().named("main"), |repository, config| {
                    repository.config = Some(config);
                    repository.calls.push("config");
                });
        }
    }

    struct Marker;

    impl Injectable for Marker {
        fn introspect(_plan: &mut Plan<'_, Self>) {}
    }

    struct Constructed(Arc<Config>);

    impl Injectable for Constructed {
        fn introspect(plan: &mut Plan<'_, Self>) {
            plan.constructor((Key::<Config>::new(),), |(config,)| Ok(Constructed(config)))
                .constructor((), |()| Err(InstantiateErrorKind::from(anyhow::anyhow!("never called"))));
        }
    }

    struct Tag;

    impl InjectionPoint for Tag {
        fn inject_to(&self, _instance: &mut dyn Any, _injector: &Injector) -> Result<(), ResolveErrorKind> {
            Ok(())
        }
    }

    #[test]
    #[traced_test]
    fn test_points_and_placeholders() {
        let mut bindings = MutableBindingSet::default();
        let recipe = introspect::<Repository>(&mut bindings, &[], &BindingKey::of::<Repository>()).unwrap();

        assert!(recipe.is_instantiable());
        assert_eq!(recipe.point.len(), 2);

        let causes: Vec<String> = bindings.proxy_causes();
        assert_eq!(
            causes,
            vec![
                "Required to inject to an instance of bindery::introspector::tests::Repository".to_string(),
                "Required to invoke the method bindery::introspector::tests::Repository::connect".to_string(),
            ]
        );
    }

    #[test]
    #[traced_test]
    fn test_not_instantiable() {
        let mut bindings = MutableBindingSet::default();
        let recipe = introspect::<Marker>(&mut bindings, &[], &BindingKey::of::<Marker>()).unwrap();

        assert!(!recipe.is_instantiable());
        assert!(recipe.point.is_empty());
    }

    #[test]
    #[traced_test]
    fn test_first_constructor_wins() {
        let mut bindings = MutableBindingSet::default();
        let recipe = introspect::<Constructed>(&mut bindings, &[], &BindingKey::of::<Constructed>()).unwrap();

        assert!(recipe.is_instantiable());
        assert!(logs_contain("Injection constructor is already marked"));
        assert_eq!(
            bindings.proxy_causes(),
            vec!["Required to invoke the constructor of bindery::introspector::tests::Constructed".to_string()]
        );
    }

    #[test]
    #[traced_test]
    fn test_participators_appended() {
        let participator: Arc<dyn InjectionParticipator> = Arc::new(|key: &BindingKey, _type_info: TypeInfo| {
            if key.name() == "tagged" {
                vec![Arc::new(Tag) as Arc<dyn InjectionPoint>]
            } else {
                Vec::new()
            }
        });

        let mut bindings = MutableBindingSet::default();
        let key = Key::<Repository>::new().named("tagged").into_raw();
        let recipe = introspect::<Repository>(&mut bindings, &[participator.clone()], &key).unwrap();
        assert_eq!(recipe.point.len(), 3);

        let recipe = introspect::<Repository>(&mut bindings, &[participator], &BindingKey::of::<Repository>()).unwrap();
        assert_eq!(recipe.point.len(), 2);
    }
}
