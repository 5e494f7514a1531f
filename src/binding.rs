use core::sync::atomic::{AtomicBool, Ordering};
use std::{
    string::{String, ToString as _},
    sync::{Arc, OnceLock},
};

use crate::{any::Instance, errors::ResolveErrorKind, point::ListPoint, provider::Provider, Injector};

/// Recipe for producing and populating the instances of a key.
pub struct Binding {
    provider: Arc<dyn Provider>,
    point: Option<Arc<ListPoint>>,
}

impl Binding {
    /// Binding built by introspection, with the injection point of its implementation.
    #[inline]
    #[must_use]
    pub(crate) fn new(provider: Arc<dyn Provider>, point: Arc<ListPoint>) -> Self {
        Self {
            provider,
            point: Some(point),
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn from_provider(provider: Arc<dyn Provider>) -> Self {
        Self { provider, point: None }
    }

    #[inline]
    #[must_use]
    pub(crate) fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// `None` if the provider doesn't come from introspection.
    #[inline]
    #[must_use]
    pub(crate) fn point(&self) -> Option<&ListPoint> {
        self.point.as_deref()
    }

    /// Hands the injector to the provider if it needs one.
    pub(crate) fn init(&self, injector: &Injector) {
        if let Some(aware) = self.provider.injector_aware() {
            aware.init(injector);
        }
    }
}

/// Placeholder for a binding that was requested before it was declared.
///
/// The delegate is set at most once. A proxy marked as resolved later is skipped by the resolver
/// and wired by the build entry point itself.
pub struct BindingProxy {
    cause: String,
    resolved_later: AtomicBool,
    delegate: OnceLock<Arc<Binding>>,
}

impl BindingProxy {
    #[inline]
    #[must_use]
    pub(crate) fn new(cause: &str) -> Self {
        Self {
            cause: cause.to_string(),
            resolved_later: AtomicBool::new(false),
            delegate: OnceLock::new(),
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn cause(&self) -> &str {
        &self.cause
    }

    #[inline]
    #[must_use]
    pub(crate) fn delegate(&self) -> Option<&Arc<Binding>> {
        self.delegate.get()
    }

    #[inline]
    #[must_use]
    pub(crate) fn is_resolved(&self) -> bool {
        self.delegate.get().is_some()
    }

    #[inline]
    pub(crate) fn mark_resolved_later(&self) {
        self.resolved_later.store(true, Ordering::Release);
    }

    #[inline]
    #[must_use]
    pub(crate) fn is_resolved_later(&self) -> bool {
        self.resolved_later.load(Ordering::Acquire)
    }

    /// Returns `false` if the proxy has already been resolved, leaving the existing delegate in place.
    #[inline]
    pub(crate) fn set_binding(&self, binding: Arc<Binding>) -> bool {
        self.delegate.set(binding).is_ok()
    }
}

#[derive(Clone)]
pub enum BindingRef {
    Bound(Arc<Binding>),
    Proxy(Arc<BindingProxy>),
}

impl BindingRef {
    #[inline]
    #[must_use]
    pub(crate) const fn is_bound(&self) -> bool {
        matches!(self, Self::Bound(_))
    }

    /// Real binding behind this reference, following a resolved proxy.
    pub(crate) fn binding(&self) -> Result<&Arc<Binding>, ResolveErrorKind> {
        match self {
            Self::Bound(binding) => Ok(binding),
            Self::Proxy(proxy) => proxy.delegate().ok_or_else(|| ResolveErrorKind::Unresolved {
                cause: proxy.cause().to_string(),
            }),
        }
    }

    #[inline]
    pub(crate) fn instance(&self) -> Result<Instance, ResolveErrorKind> {
        self.binding()?.provider().get()
    }

    #[inline]
    #[must_use]
    pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bound(left), Self::Bound(right)) => Arc::ptr_eq(left, right),
            (Self::Proxy(left), Self::Proxy(right)) => Arc::ptr_eq(left, right),
            _ => false,
        }
    }
}
