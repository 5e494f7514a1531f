mod build;
mod instantiate;
mod instantiator;
mod resolve;

pub use build::BuildErrorKind;
pub use instantiate::InstantiateErrorKind;
pub use instantiator::InstantiatorErrorKind;
pub use resolve::ResolveErrorKind;
