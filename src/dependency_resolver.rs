use crate::{binding_set::BindingSource, errors::ResolveErrorKind};

/// A single injectable slot: a constructor argument, a field or a method argument.
///
/// At introspection time [`Param::require`] asks the binding source for the binding behind the slot,
/// which may be a placeholder for a binding declared later. The returned handle is kept by the injection point
/// and turned into a value by [`Param::fetch`] every time the point is applied.
pub trait Param: 'static {
    type Value;
    type Handle: Send + Sync + 'static;

    fn require(self, source: &mut dyn BindingSource, cause: &str) -> Result<Self::Handle, ResolveErrorKind>;

    fn fetch(handle: &Self::Handle) -> Result<Self::Value, ResolveErrorKind>;
}

/// Ordered list of [`Param`]s, implemented for tuples.
pub trait Params: 'static {
    type Values;
    type Handles: Send + Sync + 'static;

    fn require(self, source: &mut dyn BindingSource, cause: &str) -> Result<Self::Handles, ResolveErrorKind>;

    fn fetch(handles: &Self::Handles) -> Result<Self::Values, ResolveErrorKind>;
}

macro_rules! impl_params {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case, unused_variables, clippy::unused_unit)]
        impl<$($ty,)*> Params for ($($ty,)*)
        where
            $( $ty: Param, )*
        {
            type Values = ($($ty::Value,)*);
            type Handles = ($($ty::Handle,)*);

            #[inline]
            fn require(self, source: &mut dyn BindingSource, cause: &str) -> Result<Self::Handles, ResolveErrorKind> {
                let ($($ty,)*) = self;
                Ok(($($ty.require(source, cause)?,)*))
            }

            #[inline]
            fn fetch(handles: &Self::Handles) -> Result<Self::Values, ResolveErrorKind> {
                let ($($ty,)*) = handles;
                Ok(($($ty::fetch($ty)?,)*))
            }
        }
    };
}

all_the_tuples!(impl_params);
