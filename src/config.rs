use crate::scope::Scope;

/// Config of an injector
/// ## Fields
/// - `automatic_bindings`:
///   If `true`, concrete types without a declared binding get one on first use
///   by [`Injector::inject_members`](crate::Injector::inject_members) and [`Injector::instantiate`](crate::Injector::instantiate).
///
///   Lookups by key never create bindings.
/// - `automatic_scope`:
///   Scope of automatic bindings.
///   [`Scope::EagerSingleton`] behaves like [`Scope::LazySingleton`] here, since the injector is already built.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub automatic_bindings: bool,
    pub automatic_scope: Scope,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            automatic_bindings: true,
            automatic_scope: Scope::PerCall,
        }
    }
}
