use core::{
    any::Any,
    fmt::{self, Debug, Display, Formatter},
    marker::PhantomData,
};
use std::{string::String, sync::Arc, vec::Vec};

use crate::any::TypeInfo;

trait AnnotationValue: Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn Any) -> bool;
}

impl<A> AnnotationValue for A
where
    A: PartialEq + Debug + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<A>().is_some_and(|other| self == other)
    }
}

/// Distinguishing marker value attached to a key.
///
/// Two annotations are equal when they have the same type and equal values.
#[derive(Clone)]
pub struct Annotation {
    type_info: TypeInfo,
    value: Arc<dyn AnnotationValue>,
}

impl Annotation {
    #[inline]
    #[must_use]
    pub fn new<A>(value: A) -> Self
    where
        A: PartialEq + Debug + Send + Sync + 'static,
    {
        Self {
            type_info: TypeInfo::of::<A>(),
            value: Arc::new(value),
        }
    }

    #[inline]
    #[must_use]
    pub const fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    #[inline]
    #[must_use]
    pub fn value<A: 'static>(&self) -> Option<&A> {
        self.value.as_any().downcast_ref()
    }
}

impl PartialEq for Annotation {
    fn eq(&self, other: &Self) -> bool {
        self.type_info == other.type_info && self.value.dyn_eq(other.value.as_any())
    }
}

impl Eq for Annotation {}

impl Debug for Annotation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.value, f)
    }
}

impl Display for Annotation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "@{:?}", self.value)
    }
}

/// Type-erased identity of a binding: the bound type, an optional name and a set of annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingKey {
    type_info: TypeInfo,
    name: String,
    annotations: Vec<Annotation>,
}

impl BindingKey {
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(TypeInfo::of::<T>())
    }

    #[inline]
    #[must_use]
    pub(crate) fn new(type_info: TypeInfo) -> Self {
        Self {
            type_info,
            name: String::new(),
            annotations: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// Adds an annotation unless an equal one is already present.
    pub(crate) fn add_annotation(&mut self, annotation: Annotation) {
        if !self.annotations.contains(&annotation) {
            self.annotations.push(annotation);
        }
    }
}

impl Display for BindingKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Type={}", self.type_info.name)?;
        if !self.name.is_empty() {
            write!(f, ", Name={}", self.name)?;
        }
        if !self.annotations.is_empty() {
            f.write_str(", Annotations=[")?;
            for (index, annotation) in self.annotations.iter().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{annotation}")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

/// Typed key used to declare and request bindings.
pub struct Key<T: ?Sized> {
    raw: BindingKey,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + 'static> Key<T> {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            raw: BindingKey::of::<T>(),
            _marker: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.raw.set_name(name.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.raw.add_annotation(annotation);
        self
    }

    #[inline]
    #[must_use]
    pub const fn raw(&self) -> &BindingKey {
        &self.raw
    }

    #[inline]
    #[must_use]
    pub fn into_raw(self) -> BindingKey {
        self.raw
    }
}

impl<T: ?Sized + 'static> Default for Key<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for Key<T> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> Debug for Key<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Key").field(&self.raw).finish()
    }
}

impl<T: ?Sized> Display for Key<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.raw, f)
    }
}

/// Bucket identity: type and name, ignoring annotations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct ReducedKey {
    pub(crate) type_info: TypeInfo,
    pub(crate) name: String,
}

impl From<&BindingKey> for ReducedKey {
    fn from(key: &BindingKey) -> Self {
        Self {
            type_info: key.type_info,
            name: key.name.clone(),
        }
    }
}

/// Key under which a binding is stored, optionally restricted to queries carrying an annotation of a given type.
#[derive(Debug, Clone)]
pub(crate) struct MappedKey {
    pub(crate) key: BindingKey,
    pub(crate) annotation_type: Option<TypeInfo>,
}

impl MappedKey {
    #[inline]
    #[must_use]
    pub(crate) const fn new(key: BindingKey, annotation_type: Option<TypeInfo>) -> Self {
        Self { key, annotation_type }
    }
}

/// Checks whether a query matches a stored key.
///
/// Every annotation of the stored key must be present in the query and every annotation of the query
/// must be present in the stored key. Query annotations of the restricting type are exempt from the second
/// check, since the restriction accepts any value of that type. If a restricting type is set,
/// the query must carry at least one annotation of exactly that type.
#[must_use]
pub(crate) fn is_matching(query: &BindingKey, candidate: &MappedKey) -> bool {
    let restricting = candidate.annotation_type;

    candidate
        .key
        .annotations
        .iter()
        .all(|annotation| query.annotations.contains(annotation))
        && query
            .annotations
            .iter()
            .filter(|annotation| Some(annotation.type_info) != restricting)
            .all(|annotation| candidate.key.annotations.contains(annotation))
        && restricting.map_or(true, |type_info| {
            query.annotations.iter().any(|annotation| annotation.type_info == type_info)
        })
}

#[cfg(test)]
mod tests {
    use super::{is_matching, Annotation, BindingKey, Key, MappedKey, ReducedKey};
    use crate::any::TypeInfo;

    #[derive(Debug, PartialEq)]
    struct Qualifier(&'static str);

    #[derive(Debug, PartialEq)]
    struct Primary;

    struct Repository;

    fn mapped(key: &Key<Repository>, annotation_type: Option<TypeInfo>) -> MappedKey {
        MappedKey::new(key.raw().clone(), annotation_type)
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Key::<Repository>::new().to_string(),
            "Type=bindery::key::tests::Repository"
        );
        assert_eq!(
            Key::<Repository>::new().named("users").to_string(),
            "Type=bindery::key::tests::Repository, Name=users"
        );
        assert_eq!(
            Key::<Repository>::new()
                .annotated(Annotation::new(Qualifier("pg")))
                .annotated(Annotation::new(Primary))
                .to_string(),
            "Type=bindery::key::tests::Repository, Annotations=[@Qualifier(\"pg\"), @Primary]"
        );
    }

    #[test]
    fn test_annotation_equality() {
        assert_eq!(Annotation::new(Qualifier("pg")), Annotation::new(Qualifier("pg")));
        assert_ne!(Annotation::new(Qualifier("pg")), Annotation::new(Qualifier("mysql")));
        assert_ne!(Annotation::new(Primary), Annotation::new(Qualifier("pg")));
        assert_eq!(Annotation::new(Qualifier("pg")).value::<Qualifier>(), Some(&Qualifier("pg")));
    }

    #[test]
    fn test_duplicate_annotation_ignored() {
        let key = Key::<Repository>::new()
            .annotated(Annotation::new(Primary))
            .annotated(Annotation::new(Primary));

        assert_eq!(key.raw().annotations().len(), 1);
    }

    #[test]
    fn test_reduced_key_ignores_annotations() {
        let plain = Key::<Repository>::new().named("users");
        let annotated = Key::<Repository>::new().named("users").annotated(Annotation::new(Primary));

        assert_eq!(ReducedKey::from(plain.raw()), ReducedKey::from(annotated.raw()));
        assert_ne!(
            ReducedKey::from(plain.raw()),
            ReducedKey::from(Key::<Repository>::new().raw())
        );
    }

    #[test]
    fn test_matching_by_value() {
        let pg = Key::<Repository>::new().annotated(Annotation::new(Qualifier("pg")));
        let mysql = Key::<Repository>::new().annotated(Annotation::new(Qualifier("mysql")));
        let plain = Key::<Repository>::new();

        assert!(is_matching(pg.raw(), &mapped(&pg, None)));
        assert!(!is_matching(mysql.raw(), &mapped(&pg, None)));
        assert!(!is_matching(plain.raw(), &mapped(&pg, None)));
        assert!(!is_matching(pg.raw(), &mapped(&plain, None)));
        assert!(is_matching(plain.raw(), &mapped(&plain, None)));
    }

    #[test]
    fn test_matching_restricting_type() {
        let stored = mapped(&Key::<Repository>::new(), Some(TypeInfo::of::<Qualifier>()));

        let pg = Key::<Repository>::new().annotated(Annotation::new(Qualifier("pg")));
        let mysql = Key::<Repository>::new().annotated(Annotation::new(Qualifier("mysql")));
        let primary = Key::<Repository>::new().annotated(Annotation::new(Primary));

        assert!(is_matching(pg.raw(), &stored));
        assert!(is_matching(mysql.raw(), &stored));
        assert!(!is_matching(Key::<Repository>::new().raw(), &stored));
        assert!(!is_matching(primary.raw(), &stored));
    }

    #[test]
    fn test_binding_key_of() {
        let key = BindingKey::of::<Repository>();

        assert_eq!(key.type_info(), TypeInfo::of::<Repository>());
        assert_eq!(key.name(), "");
        assert!(key.annotations().is_empty());
    }
}
