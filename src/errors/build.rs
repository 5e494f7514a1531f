use std::string::String;

use super::resolve::ResolveErrorKind;

/// Configuration error reported by the build entry point. No injector is returned once one occurs.
#[derive(thiserror::Error, Debug)]
pub enum BuildErrorKind {
    #[error("At least one module is required to build an injector")]
    NoModules,
    #[error("The target of the binding for {key} has already been specified")]
    ConflictingTarget { key: String },
    #[error("The scope of the binding for {key} has already been specified")]
    ScopeAlreadySet { key: String },
    #[error("The annotation of the binding for {key} has already been specified")]
    AnnotationAlreadySet { key: String },
    #[error("No scope has been specified for the binding of {key}")]
    MissingScope { key: String },
    #[error("No target has been specified for the binding of {key}")]
    NoTarget { key: String },
    #[error("Type {type_name} has no injection constructor and can't be instantiated")]
    NotInstantiable { type_name: &'static str },
    #[error("No binding registered for key: {key}. {cause}")]
    Unresolved { key: String, cause: String },
    #[error("Failed to create an eager singleton: {0}")]
    Eager(ResolveErrorKind),
    #[error(transparent)]
    Resolve(#[from] ResolveErrorKind),
}
