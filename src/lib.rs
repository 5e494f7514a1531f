#[macro_use]
pub(crate) mod macros;

pub(crate) mod any;
pub(crate) mod binder;
pub(crate) mod binding;
pub(crate) mod binding_set;
pub(crate) mod builder;
pub(crate) mod config;
pub(crate) mod dependency_resolver;
pub(crate) mod errors;
pub(crate) mod inject;
pub(crate) mod injector;
pub(crate) mod introspector;
pub(crate) mod key;
pub(crate) mod listener;
pub(crate) mod point;
pub(crate) mod provider;
pub(crate) mod scope;
pub(crate) mod service;

pub use any::{Instance, TypeInfo};
pub use binder::{Binder, BindingBuilder, Module};
pub use binding::{Binding, BindingProxy, BindingRef};
pub use binding_set::BindingSource;
pub use builder::{build, InjectorBuilder};
pub use config::Config;
pub use dependency_resolver::{Param, Params};
pub use errors::{BuildErrorKind, InstantiateErrorKind, InstantiatorErrorKind, ResolveErrorKind};
pub use inject::{Deferred, Dependency, Lazy};
pub use injector::Injector;
pub use introspector::{Injectable, Plan};
pub use key::{Annotation, BindingKey, Key};
pub use listener::{InjectionListener, InjectionParticipator, InjectorBuildListener};
pub use point::{InjectionPoint, ListPoint};
pub use scope::Scope;
