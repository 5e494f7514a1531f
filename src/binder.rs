use core::{any::type_name, marker::PhantomData};
use std::{boxed::Box, format, string::String, string::ToString as _, sync::Arc, vec::Vec};

use crate::{
    any::TypeInfo,
    binding::Binding,
    binding_set::MutableBindingSet,
    dependency_resolver::Params,
    errors::{BuildErrorKind, InstantiateErrorKind, ResolveErrorKind},
    introspector::{self, Injectable},
    key::{Annotation, BindingKey, Key, MappedKey},
    listener::{
        InjectionListener, InjectionListeners, InjectionParticipator, InjectorBuildListener, Notifier,
    },
    point::ListPoint,
    provider::{boxed_constructor_provider, boxed_fn_provider, BoxedBaseProvider},
    scope::{scoped_provider, EagerSingletonProvider, Scope},
};

/// Unit of configuration, called once with the binder while the injector is built.
pub trait Module {
    fn configure(&self, binder: &mut Binder);
}

impl<F> Module for F
where
    F: Fn(&mut Binder),
{
    #[inline]
    fn configure(&self, binder: &mut Binder) {
        self(binder);
    }
}

/// Collects bindings and listeners declared by modules.
#[derive(Default)]
pub struct Binder {
    pub(crate) declarations: Vec<Declaration>,
    pub(crate) injection_listeners: Vec<Arc<dyn InjectionListener>>,
    pub(crate) build_listeners: Vec<Box<dyn InjectorBuildListener>>,
    pub(crate) participators: Vec<Arc<dyn InjectionParticipator>>,
}

impl Binder {
    /// Declares a binding for `T` without a name or annotations.
    #[inline]
    pub fn bind<T>(&mut self) -> BindingBuilder<'_, T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.bind_key(Key::new())
    }

    #[inline]
    pub fn bind_named<T>(&mut self, name: impl Into<String>) -> BindingBuilder<'_, T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.bind_key(Key::new().named(name))
    }

    pub fn bind_key<T>(&mut self, key: Key<T>) -> BindingBuilder<'_, T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let index = self.declarations.len();
        self.declarations.push(Declaration::new(key.into_raw()));

        BindingBuilder {
            binder: self,
            index,
            _marker: PhantomData,
        }
    }

    pub fn add_injection_listener(&mut self, listener: impl InjectionListener + 'static) -> &mut Self {
        self.injection_listeners.push(Arc::new(listener));
        self
    }

    pub fn add_build_listener(&mut self, listener: impl InjectorBuildListener + 'static) -> &mut Self {
        self.build_listeners.push(Box::new(listener));
        self
    }

    pub fn add_participator(&mut self, participator: impl InjectionParticipator + 'static) -> &mut Self {
        self.participators.push(Arc::new(participator));
        self
    }
}

/// Fluent declaration of one binding.
///
/// Exactly one target must be chosen, and a scope must be set unless the target implies one.
/// Mistakes are reported by the build, not here.
pub struct BindingBuilder<'a, T: ?Sized> {
    binder: &'a mut Binder,
    index: usize,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T> BindingBuilder<'_, T>
where
    T: ?Sized + Send + Sync + 'static,
{
    fn declaration(&mut self) -> &mut Declaration {
        &mut self.binder.declarations[self.index]
    }

    /// Restricts the binding to queries carrying an equal annotation.
    pub fn annotated_with(&mut self, annotation: Annotation) -> &mut Self {
        let declaration = self.declaration();
        if declaration.annotation.is_some() {
            declaration.fail(BuildErrorKind::AnnotationAlreadySet {
                key: declaration.key.to_string(),
            });
        } else {
            declaration.annotation = Some(annotation);
        }
        self
    }

    /// Restricts the binding to queries carrying any annotation of type `A`.
    pub fn annotated_with_type<A: 'static>(&mut self) -> &mut Self {
        let declaration = self.declaration();
        if declaration.annotation_type.is_some() {
            declaration.fail(BuildErrorKind::AnnotationAlreadySet {
                key: declaration.key.to_string(),
            });
        } else {
            declaration.annotation_type = Some(TypeInfo::of::<A>());
        }
        self
    }

    /// Binds to an introspected implementation. `cast` converts it to the bound type, usually an unsizing coercion.
    pub fn to<S, C>(&mut self, cast: C) -> &mut Self
    where
        S: Injectable,
        C: Fn(Arc<S>) -> Arc<T> + Send + Sync + 'static,
    {
        self.declaration().set_target(Box::new(move |context: &mut DeclareContext<'_>, key: &BindingKey| {
            let recipe = introspector::introspect::<S>(&mut *context.bindings, context.participators, key)?;
            if !recipe.is_instantiable() {
                return Err(BuildErrorKind::NotInstantiable {
                    type_name: type_name::<S>(),
                });
            }

            let point = recipe.point.clone();
            let provider = boxed_constructor_provider(recipe, cast, context.notifier(key));
            Ok((provider, Some(point)))
        }));
        self
    }

    /// Binds to a factory whose parameters are injected.
    pub fn to_factory<P, F>(&mut self, params: P, factory: F) -> &mut Self
    where
        P: Params,
        F: Fn(P::Values) -> Result<Arc<T>, InstantiateErrorKind> + Send + Sync + 'static,
    {
        self.declaration().set_target(Box::new(move |context: &mut DeclareContext<'_>, key: &BindingKey| {
            let cause = format!("Required to invoke the factory of {key}");
            let handles = params.require(&mut *context.bindings, &cause)?;

            let provider = boxed_fn_provider(
                move || {
                    let values = P::fetch(&handles).map_err(ResolveErrorKind::deps)?;
                    factory(values).map_err(Into::into)
                },
                context.notifier(key),
            );
            Ok((provider, None))
        }));
        self
    }

    /// Binds to a closure without dependencies.
    pub fn to_provider<F>(&mut self, provider: F) -> &mut Self
    where
        F: Fn() -> Result<Arc<T>, InstantiateErrorKind> + Send + Sync + 'static,
    {
        self.to_factory((), move |()| provider())
    }

    /// Binds to an existing instance. The binding becomes an eager singleton.
    pub fn to_instance(&mut self, instance: Arc<T>) {
        self.to_provider(move || Ok(instance.clone()));
        self.scope(Scope::EagerSingleton);
    }

    pub fn scope(&mut self, scope: Scope) {
        let declaration = self.declaration();
        if declaration.scope.is_some() {
            declaration.fail(BuildErrorKind::ScopeAlreadySet {
                key: declaration.key.to_string(),
            });
        } else {
            declaration.scope = Some(scope);
        }
    }

    #[inline]
    pub fn per_call(&mut self) {
        self.scope(Scope::PerCall);
    }

    #[inline]
    pub fn as_eager_singleton(&mut self) {
        self.scope(Scope::EagerSingleton);
    }

    #[inline]
    pub fn as_lazy_singleton(&mut self) {
        self.scope(Scope::LazySingleton);
    }
}

impl<T: Injectable> BindingBuilder<'_, T> {
    /// Binds the type to its own introspected constructor.
    #[inline]
    pub fn to_self(&mut self) -> &mut Self {
        self.to::<T, _>(|instance| instance)
    }
}

type Target = Box<dyn FnOnce(&mut DeclareContext<'_>, &BindingKey) -> Result<(BoxedBaseProvider, Option<Arc<ListPoint>>), BuildErrorKind>>;

pub(crate) struct DeclareContext<'a> {
    pub(crate) bindings: &'a mut MutableBindingSet,
    pub(crate) participators: &'a [Arc<dyn InjectionParticipator>],
    pub(crate) listeners: &'a InjectionListeners,
}

impl DeclareContext<'_> {
    #[inline]
    #[must_use]
    fn notifier(&self, key: &BindingKey) -> Notifier {
        Notifier::new(key.clone(), self.listeners.clone())
    }
}

pub(crate) struct Declaration {
    key: BindingKey,
    annotation: Option<Annotation>,
    annotation_type: Option<TypeInfo>,
    target: Option<Target>,
    scope: Option<Scope>,
    error: Option<BuildErrorKind>,
}

impl Declaration {
    fn new(key: BindingKey) -> Self {
        Self {
            key,
            annotation: None,
            annotation_type: None,
            target: None,
            scope: None,
            error: None,
        }
    }

    /// Keeps the first mistake only.
    fn fail(&mut self, err: BuildErrorKind) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    fn set_target(&mut self, target: Target) {
        if self.target.is_some() {
            self.fail(BuildErrorKind::ConflictingTarget {
                key: self.key.to_string(),
            });
        } else {
            self.target = Some(target);
        }
    }

    /// Adds the binding to the set. Returns the provider if it has to be constructed eagerly.
    pub(crate) fn declare(self, context: &mut DeclareContext<'_>) -> Result<Option<Arc<EagerSingletonProvider>>, BuildErrorKind> {
        let Self {
            mut key,
            annotation,
            annotation_type,
            target,
            scope,
            error,
        } = self;

        if let Some(err) = error {
            return Err(err);
        }
        if let Some(annotation) = annotation {
            key.add_annotation(annotation);
        }

        let Some(target) = target else {
            return Err(BuildErrorKind::NoTarget { key: key.to_string() });
        };
        let Some(scope) = scope else {
            return Err(BuildErrorKind::MissingScope { key: key.to_string() });
        };

        let (base, point) = target(context, &key)?;
        let (provider, eager) = scoped_provider(scope, key.type_info(), base);
        let binding = match point {
            Some(point) => Binding::new(provider, point),
            None => Binding::from_provider(provider),
        };
        context
            .bindings
            .add(MappedKey::new(key, annotation_type), Arc::new(binding));

        Ok(eager)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{Binder, DeclareContext};
    use crate::{
        binding_set::{BindingSource as _, MutableBindingSet},
        errors::BuildErrorKind,
        key::{Annotation, Key},
        listener::InjectionListeners,
        Injectable, Plan,
    };

    #[derive(Debug, PartialEq)]
    struct Primary;

    #[derive(Default)]
    struct Service;

    impl Injectable for Service {
        fn introspect(plan: &mut Plan<'_, Self>) {
            plan.default_constructor();
        }
    }

    struct Abstract;

    impl Injectable for Abstract {
        fn introspect(_plan: &mut Plan<'_, Self>) {}
    }

    fn declare(binder: Binder) -> (MutableBindingSet, Result<usize, BuildErrorKind>) {
        let mut bindings = MutableBindingSet::default();
        let listeners: InjectionListeners = Arc::from(Vec::new());
        let mut context = DeclareContext {
            bindings: &mut bindings,
            participators: &[],
            listeners: &listeners,
        };

        let mut eager = 0;
        for declaration in binder.declarations {
            match declaration.declare(&mut context) {
                Ok(provider) => eager += usize::from(provider.is_some()),
                Err(err) => return (bindings, Err(err)),
            }
        }
        (bindings, Ok(eager))
    }

    #[test]
    fn test_declarations() {
        let mut binder = Binder::default();
        binder.bind::<Service>().to_self().per_call();
        binder.bind_named::<u8>("port").to_instance(Arc::new(8));
        binder
            .bind::<Service>()
            .annotated_with(Annotation::new(Primary))
            .to_self()
            .as_lazy_singleton();

        let (mut bindings, eager) = declare(binder);
        assert_eq!(eager.unwrap(), 1);

        for key in [
            Key::<Service>::new().into_raw(),
            Key::<u8>::new().named("port").into_raw(),
            Key::<Service>::new().annotated(Annotation::new(Primary)).into_raw(),
        ] {
            let binding = bindings.require_binding(&key, "Required by test").unwrap();
            assert!(binding.is_bound(), "{key} must be declared");
        }
    }

    #[test]
    fn test_conflicting_target() {
        let mut binder = Binder::default();
        binder
            .bind::<Service>()
            .to_self()
            .to_provider(|| Ok(Arc::new(Service)))
            .per_call();

        let (_, result) = declare(binder);
        assert!(matches!(result, Err(BuildErrorKind::ConflictingTarget { .. })));
    }

    #[test]
    fn test_scope_already_set() {
        let mut binder = Binder::default();
        let mut builder = binder.bind::<Service>();
        builder.to_self().per_call();
        builder.as_eager_singleton();
        drop(builder);

        let (_, result) = declare(binder);
        assert!(matches!(result, Err(BuildErrorKind::ScopeAlreadySet { .. })));
    }

    #[test]
    fn test_instance_scope_is_fixed() {
        let mut binder = Binder::default();
        let mut builder = binder.bind::<u8>();
        builder.to_instance(Arc::new(1));
        builder.per_call();
        drop(builder);

        let (_, result) = declare(binder);
        assert!(matches!(result, Err(BuildErrorKind::ScopeAlreadySet { .. })));
    }

    #[test]
    fn test_annotation_already_set() {
        let mut binder = Binder::default();
        binder
            .bind::<Service>()
            .annotated_with(Annotation::new(Primary))
            .annotated_with(Annotation::new(Primary))
            .to_self()
            .per_call();

        let (_, result) = declare(binder);
        assert!(matches!(result, Err(BuildErrorKind::AnnotationAlreadySet { .. })));
    }

    #[test]
    fn test_missing_scope_and_target() {
        let mut binder = Binder::default();
        binder.bind::<Service>().to_self();
        let (_, result) = declare(binder);
        assert_eq!(
            result.unwrap_err().to_string(),
            "No scope has been specified for the binding of Type=bindery::binder::tests::Service"
        );

        let mut binder = Binder::default();
        binder.bind::<Service>().per_call();
        let (_, result) = declare(binder);
        assert!(matches!(result, Err(BuildErrorKind::NoTarget { .. })));
    }

    #[test]
    fn test_not_instantiable() {
        let mut binder = Binder::default();
        binder.bind::<Abstract>().to_self().per_call();

        let (_, result) = declare(binder);
        assert!(matches!(
            result,
            Err(BuildErrorKind::NotInstantiable { type_name }) if type_name == "bindery::binder::tests::Abstract"
        ));
    }
}
