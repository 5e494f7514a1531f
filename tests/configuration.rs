use std::sync::Arc;
use tracing_test::traced_test;

use bindery::{
    build, Binder, BuildErrorKind, Config, Injectable, InjectorBuilder, Key, Module, Plan, ResolveErrorKind, Scope,
};

#[derive(Debug)]
struct Server {
    port: Arc<u16>,
}

impl Injectable for Server {
    fn introspect(plan: &mut Plan<'_, Self>) {
        plan.constructor((Key::<u16>::new().named("port"),), |(port,)| Ok(Server { port }));
    }
}

#[derive(Debug)]
struct Plugin;

impl Injectable for Plugin {
    fn introspect(_plan: &mut Plan<'_, Self>) {}
}

#[derive(Debug)]
struct Broken;

impl Injectable for Broken {
    fn introspect(plan: &mut Plan<'_, Self>) {
        plan.constructor((), |()| Err(anyhow::anyhow!("Connection refused").into()));
    }
}

#[derive(Debug, Default)]
struct Endpoint {
    server: Option<Arc<Server>>,
}

impl Injectable for Endpoint {
    fn introspect(plan: &mut Plan<'_, Self>) {
        plan.default_constructor()
            .field("server", Key::<Server>::new(), |endpoint, server| endpoint.server = Some(server));
    }
}

#[test]
#[traced_test]
fn test_no_modules() {
    let err = build(Vec::<Box<dyn Module>>::new()).unwrap_err();
    assert!(matches!(err, BuildErrorKind::NoModules));
}

#[test]
#[traced_test]
fn test_unresolved_dependency() {
    let err = InjectorBuilder::new()
        .module(|binder: &mut Binder| {
            binder.bind::<Server>().to_self().per_call();
            binder.bind::<u16>().to_instance(Arc::new(8080));
        })
        .build()
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "No binding registered for key: Type=u16, Name=port. Required to invoke the constructor of configuration::Server"
    );
}

#[test]
#[traced_test]
fn test_declaration_mistakes() {
    let err = InjectorBuilder::new()
        .module(|binder: &mut Binder| {
            binder.bind_named::<u16>("port").to_instance(Arc::new(8080));
            binder.bind::<Server>().to_self();
        })
        .build()
        .unwrap_err();
    assert!(matches!(err, BuildErrorKind::MissingScope { .. }));

    let err = InjectorBuilder::new()
        .module(|binder: &mut Binder| {
            binder
                .bind_named::<u16>("port")
                .to_provider(|| Ok(Arc::new(80)))
                .to_factory((), |()| Ok(Arc::new(443)))
                .per_call();
        })
        .build()
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "The target of the binding for Type=u16, Name=port has already been specified"
    );

    let err = InjectorBuilder::new()
        .module(|binder: &mut Binder| {
            binder.bind::<Plugin>().to_self().as_lazy_singleton();
        })
        .build()
        .unwrap_err();
    assert!(matches!(err, BuildErrorKind::NotInstantiable { .. }));
}

#[test]
#[traced_test]
fn test_eager_singleton_failure() {
    let err = InjectorBuilder::new()
        .module(|binder: &mut Binder| {
            binder.bind::<Broken>().to_self().as_eager_singleton();
        })
        .build()
        .unwrap_err();

    assert!(matches!(err, BuildErrorKind::Eager(_)));
    assert_eq!(err.to_string(), "Failed to create an eager singleton: Connection refused");
}

#[test]
#[traced_test]
fn test_lazy_singleton_failure_is_not_cached() {
    let injector = InjectorBuilder::new()
        .module(|binder: &mut Binder| {
            binder.bind::<Broken>().to_self().as_lazy_singleton();
        })
        .build()
        .unwrap();

    for _ in 0..2 {
        let err = injector.require_instance::<Broken>().unwrap_err();
        assert!(matches!(err, ResolveErrorKind::Instantiator(_)));
        assert_eq!(err.to_string(), "Connection refused");
    }
}

#[test]
#[traced_test]
fn test_automatic_bindings_disabled() {
    let injector = InjectorBuilder::new()
        .config(Config {
            automatic_bindings: false,
            ..Config::default()
        })
        .module(|binder: &mut Binder| {
            binder.bind_named::<u16>("port").to_instance(Arc::new(8080));
            binder.bind::<Server>().to_self().per_call();
        })
        .build()
        .unwrap();

    let err = injector.instantiate::<Endpoint>().unwrap_err();
    assert!(matches!(err, ResolveErrorKind::NoSuchBinding { .. }));

    let mut endpoint = Endpoint::default();
    assert!(injector.inject_members(&mut endpoint).is_err());
    assert!(endpoint.server.is_none());
}

#[test]
#[traced_test]
fn test_automatic_scope() {
    let injector = InjectorBuilder::new()
        .config(Config {
            automatic_scope: Scope::EagerSingleton,
            ..Config::default()
        })
        .module(|binder: &mut Binder| {
            binder.bind_named::<u16>("port").to_instance(Arc::new(8080));
            binder.bind::<Server>().to_self().per_call();
        })
        .build()
        .unwrap();

    let first = injector.instantiate::<Endpoint>().unwrap();
    let second = injector.instantiate::<Endpoint>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(*first.server.as_ref().unwrap().port, 8080);

    let err = injector.instantiate::<Plugin>().unwrap_err();
    assert!(matches!(err, ResolveErrorKind::NotInstantiable { .. }));
}
