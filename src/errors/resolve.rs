use std::{boxed::Box, string::String};

use super::{instantiate::InstantiateErrorKind, instantiator::InstantiatorErrorKind};

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("No binding registered for key: {key}")]
    NoSuchBinding { key: String },
    #[error("Binding hasn't been resolved. {cause}")]
    Unresolved { cause: String },
    #[error("Provider for {type_name} is used before the injector was initialized or after it was dropped")]
    Uninitialized { type_name: &'static str },
    #[error("Type {type_name} has no injection constructor and can't be instantiated")]
    NotInstantiable { type_name: &'static str },
    #[error("Incorrect instance type. Expected: {expected}")]
    IncorrectType { expected: &'static str },
    #[error(transparent)]
    Instantiator(InstantiatorErrorKind<Box<ResolveErrorKind>, InstantiateErrorKind>),
}

impl ResolveErrorKind {
    /// Wraps a failure of a dependency of the instance being built.
    #[inline]
    #[must_use]
    pub fn deps(err: ResolveErrorKind) -> Self {
        Self::Instantiator(InstantiatorErrorKind::Deps(Box::new(err)))
    }
}

impl From<InstantiateErrorKind> for ResolveErrorKind {
    #[inline]
    fn from(err: InstantiateErrorKind) -> Self {
        Self::Instantiator(InstantiatorErrorKind::Factory(err))
    }
}

#[cfg(test)]
mod tests {
    use super::ResolveErrorKind;
    use crate::errors::InstantiateErrorKind;

    #[test]
    fn test_cause_preserved() {
        let err = ResolveErrorKind::from(InstantiateErrorKind::from(anyhow::anyhow!("disk is full")));
        assert_eq!(err.to_string(), "disk is full");

        let err = ResolveErrorKind::deps(ResolveErrorKind::NoSuchBinding { key: "Type=u8".into() });
        assert_eq!(err.to_string(), "No binding registered for key: Type=u8");
    }
}
