//! Type metadata exposed by a type index before a type is loaded.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Supertype name every discoverable type handler declares
pub const TYPE_HANDLER_SUPERTYPE: &str = "mapforge.TypeHandler";

/// A `/`-separated entry in a type index, e.g. `a/b/User`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceEntry {
    location: String,
}

impl ResourceEntry {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// Entry for a dotted type name
    pub fn for_type(type_name: &str) -> Self {
        Self::new(type_name.replace('.', "/"))
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Dotted package portion of the location
    pub fn package(&self) -> String {
        match self.location.rsplit_once('/') {
            Some((package, _)) => package.replace('/', "."),
            None => String::new(),
        }
    }
}

impl fmt::Display for ResourceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.location)
    }
}

/// Structural facts about a type, readable without loading it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeMetadata {
    /// Fully-qualified dotted name
    pub name: String,
    pub is_interface: bool,
    pub is_abstract: bool,
    pub is_anonymous: bool,
    /// Declared inside another type
    pub is_nested: bool,
    /// Every supertype the type is assignable to
    pub supertypes: Vec<String>,
    /// Explicit alias annotation
    pub alias: Option<String>,
    /// Types a handler maps, for type handler candidates
    pub mapped_types: Vec<String>,
}

impl TypeMetadata {
    /// A plain concrete type
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn interface(mut self) -> Self {
        self.is_interface = true;
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.is_anonymous = true;
        self
    }

    pub fn nested(mut self) -> Self {
        self.is_nested = true;
        self
    }

    pub fn with_supertype(mut self, supertype: impl Into<String>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Mark as a type handler for `mapped_type`
    pub fn handler_for(mut self, mapped_type: impl Into<String>) -> Self {
        if !self.supertypes.iter().any(|s| s == TYPE_HANDLER_SUPERTYPE) {
            self.supertypes.push(TYPE_HANDLER_SUPERTYPE.to_string());
        }
        self.mapped_types.push(mapped_type.into());
        self
    }

    pub fn package(&self) -> &str {
        self.name.rsplit_once('.').map(|(p, _)| p).unwrap_or("")
    }

    pub fn simple_name(&self) -> &str {
        self.name
            .rsplit_once('.')
            .map(|(_, n)| n)
            .unwrap_or(&self.name)
    }

    /// `true` for the type itself or any declared supertype
    pub fn is_assignable_to(&self, type_name: &str) -> bool {
        self.name == type_name || self.supertypes.iter().any(|s| s == type_name)
    }
}

/// A loaded type. Identity is the fully-qualified name.
#[derive(Clone)]
pub struct TypeRef(Arc<TypeMetadata>);

impl TypeRef {
    pub fn new(metadata: TypeMetadata) -> Self {
        Self(Arc::new(metadata))
    }

    pub fn metadata(&self) -> &TypeMetadata {
        &self.0
    }
}

impl Deref for TypeRef {
    type Target = TypeMetadata;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.name == other.0.name
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name.hash(state);
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.0.name)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

/// Capability predicate over type metadata
#[derive(Clone)]
pub struct TypeFilter {
    description: String,
    predicate: Arc<dyn Fn(&TypeMetadata) -> bool + Send + Sync>,
}

impl TypeFilter {
    pub fn new(
        description: impl Into<String>,
        predicate: impl Fn(&TypeMetadata) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Accept every candidate
    pub fn any() -> Self {
        Self::new("any", |_| true)
    }

    pub fn assignable_to(supertype: impl Into<String>) -> Self {
        let supertype = supertype.into();
        Self::new(format!("assignable to {}", supertype), move |m| {
            m.is_assignable_to(&supertype)
        })
    }

    /// Not interface, anonymous or nested; candidates for alias registration
    pub fn aliasable() -> Self {
        Self::new("aliasable", |m| {
            !m.is_anonymous && !m.is_interface && !m.is_nested
        })
    }

    /// Instantiable type handlers
    pub fn concrete_handler() -> Self {
        Self::assignable_to(TYPE_HANDLER_SUPERTYPE).and(Self::new("concrete", |m| {
            !m.is_anonymous && !m.is_interface && !m.is_abstract
        }))
    }

    pub fn and(self, other: TypeFilter) -> Self {
        let description = format!("{} and {}", self.description, other.description);
        let (left, right) = (self.predicate, other.predicate);
        Self {
            description,
            predicate: Arc::new(move |m| left(m) && right(m)),
        }
    }

    pub fn matches(&self, metadata: &TypeMetadata) -> bool {
        (self.predicate)(metadata)
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeFilter")
            .field("description", &self.description)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names() {
        let meta = TypeMetadata::class("a.b.User");
        assert_eq!(meta.package(), "a.b");
        assert_eq!(meta.simple_name(), "User");
        assert_eq!(ResourceEntry::for_type("a.b.User").package(), "a.b");
        assert_eq!(ResourceEntry::new("Root").package(), "");
    }

    #[test]
    fn test_type_ref_identity_is_name() {
        let a = TypeRef::new(TypeMetadata::class("a.User"));
        let b = TypeRef::new(TypeMetadata::class("a.User").with_alias("u"));
        let set: HashSet<TypeRef> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_alias_filter_composition() {
        let filter = TypeFilter::assignable_to("a.Base").and(TypeFilter::aliasable());

        assert!(filter.matches(&TypeMetadata::class("a.User").with_supertype("a.Base")));
        assert!(filter.matches(&TypeMetadata::class("a.Base")));
        assert!(!filter.matches(&TypeMetadata::class("a.Other")));
        assert!(!filter.matches(&TypeMetadata::class("a.Api").with_supertype("a.Base").interface()));
        assert!(!filter.matches(&TypeMetadata::class("a.In").with_supertype("a.Base").nested()));
    }

    #[test]
    fn test_concrete_handler_filter() {
        let filter = TypeFilter::concrete_handler();
        assert!(filter.matches(&TypeMetadata::class("h.Money").handler_for("Money")));
        assert!(!filter.matches(&TypeMetadata::class("h.Base").handler_for("X").abstract_type()));
        assert!(!filter.matches(&TypeMetadata::class("h.Plain")));
    }
}
