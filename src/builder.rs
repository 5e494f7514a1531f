use std::{boxed::Box, sync::Arc, vec::Vec};
use tracing::{debug, error, info_span};

use crate::{
    binder::{Binder, DeclareContext, Module},
    binding::{Binding, BindingRef},
    binding_set::{BindingSource as _, ImmutableBindingSet, MutableBindingSet, ResolvableBindingSet},
    config::Config,
    errors::BuildErrorKind,
    key::BindingKey,
    listener::{InjectionListeners, InjectionParticipators},
    provider::InjectorProvider,
    Injector,
};

/// Builds an [`Injector`] from an ordered list of modules.
///
/// ```rust
/// use std::sync::Arc;
/// use bindery::{Binder, InjectorBuilder};
///
/// let injector = InjectorBuilder::new()
///     .module(|binder: &mut Binder| {
///         binder.bind_named::<str>("greeting").to_instance(Arc::from("hello"));
///     })
///     .build()
///     .unwrap();
///
/// assert_eq!(&*injector.require_named_instance::<str>("greeting").unwrap(), "hello");
/// ```
#[derive(Default)]
pub struct InjectorBuilder {
    modules: Vec<Box<dyn Module>>,
    config: Config,
}

impl InjectorBuilder {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn module(mut self, module: impl Module + 'static) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    #[inline]
    #[must_use]
    pub fn modules(mut self, modules: impl IntoIterator<Item = Box<dyn Module>>) -> Self {
        self.modules.extend(modules);
        self
    }

    #[inline]
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Configures the modules in order, resolves every placeholder, wires the injector
    /// and constructs eager singletons in declaration order.
    ///
    /// # Errors
    /// Returns [`BuildErrorKind`] on any configuration mistake. No injector is returned in that case.
    pub fn build(self) -> Result<Injector, BuildErrorKind> {
        let span = info_span!("build", modules = self.modules.len());
        let _guard = span.enter();

        let result = self.build_inner();
        if let Err(err) = &result {
            error!("{}", err);
        }
        result
    }

    fn build_inner(self) -> Result<Injector, BuildErrorKind> {
        let Self { modules, config } = self;
        if modules.is_empty() {
            return Err(BuildErrorKind::NoModules);
        }

        let mut binder = Binder::default();
        for module in &modules {
            module.configure(&mut binder);
        }

        let Binder {
            declarations,
            injection_listeners,
            build_listeners,
            participators,
        } = binder;
        let listeners: InjectionListeners = injection_listeners.into();
        let participators: InjectionParticipators = participators.into();

        let mut bindings = MutableBindingSet::default();
        let mut eager = Vec::new();
        {
            let mut context = DeclareContext {
                bindings: &mut bindings,
                participators: &participators,
                listeners: &listeners,
            };
            for declaration in declarations {
                eager.extend(declaration.declare(&mut context)?);
            }
        }

        let injector_key = BindingKey::of::<Injector>();
        let injector_proxy = if bindings.find_bound(&injector_key).is_some() {
            // Placeholders created earlier are wired to the module binding by the resolver.
            debug!("Injector is bound by a module");
            None
        } else {
            match bindings.require_binding(&injector_key, "Required to bind the injector to itself")? {
                BindingRef::Proxy(proxy) => {
                    proxy.mark_resolved_later();
                    Some(proxy)
                }
                BindingRef::Bound(_) => None,
            }
        };

        let bindings = ResolvableBindingSet::from(bindings);
        bindings.resolve()?;

        let injector = Injector::new(ImmutableBindingSet::from(bindings), config, listeners, participators);
        if let Some(proxy) = injector_proxy {
            proxy.set_binding(Arc::new(Binding::from_provider(Arc::new(InjectorProvider::new(&injector)))));
        }

        for binding in injector.bindings().bindings() {
            if let BindingRef::Bound(binding) = binding {
                binding.init(&injector);
            }
        }

        for provider in eager {
            provider.initialize().map_err(BuildErrorKind::Eager)?;
        }

        for listener in build_listeners {
            listener.created(&injector);
        }

        debug!("Injector built");
        Ok(injector)
    }
}

/// Shorthand for [`InjectorBuilder`] with the default [`Config`].
///
/// # Errors
/// Returns [`BuildErrorKind`] on any configuration mistake.
pub fn build(modules: impl IntoIterator<Item = Box<dyn Module>>) -> Result<Injector, BuildErrorKind> {
    InjectorBuilder::new().modules(modules).build()
}
