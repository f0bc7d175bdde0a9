//! Registries for aliases, type handlers, language drivers and plugins.

use crate::error::{SessionError, SessionResult};
use crate::scanning::TypeRef;
use crate::session::{Interceptor, LanguageDriver, TypeHandler};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Case-insensitive alias to type mapping
#[derive(Debug, Clone, Default)]
pub struct TypeAliasRegistry {
    aliases: HashMap<String, TypeRef>,
}

impl TypeAliasRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under the type's alias annotation, or its simple name
    pub fn register_type(&mut self, type_ref: TypeRef) -> SessionResult<String> {
        let alias = type_ref
            .alias
            .clone()
            .unwrap_or_else(|| type_ref.simple_name().to_string());
        self.register_alias(&alias, type_ref)?;
        Ok(alias)
    }

    pub fn register_alias(&mut self, alias: &str, type_ref: TypeRef) -> SessionResult<()> {
        if alias.trim().is_empty() {
            return Err(SessionError::registration(format!(
                "empty type alias for '{}'",
                type_ref
            )));
        }
        self.aliases.insert(alias.to_lowercase(), type_ref);
        Ok(())
    }

    pub fn resolve(&self, alias: &str) -> Option<&TypeRef> {
        self.aliases.get(&alias.to_lowercase())
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.aliases.contains_key(&alias.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// A handler instance or a discovered handler type
#[derive(Debug, Clone)]
pub enum HandlerBinding {
    Instance(Arc<dyn TypeHandler>),
    Discovered(TypeRef),
}

impl HandlerBinding {
    pub fn name(&self) -> &str {
        match self {
            HandlerBinding::Instance(handler) => handler.name(),
            HandlerBinding::Discovered(type_ref) => &type_ref.name,
        }
    }
}

/// Type handlers keyed by the type they map
#[derive(Debug, Clone, Default)]
pub struct TypeHandlerRegistry {
    handlers: HashMap<String, HandlerBinding>,
    unmapped: Vec<TypeRef>,
}

impl TypeHandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn TypeHandler>) -> SessionResult<()> {
        let mapped = handler.mapped_type().to_string();
        if mapped.is_empty() {
            return Err(SessionError::registration(format!(
                "type handler '{}' does not declare a mapped type",
                handler.name()
            )));
        }
        self.handlers.insert(mapped, HandlerBinding::Instance(handler));
        Ok(())
    }

    /// Register a discovered handler for every type it declares; handlers
    /// without declared types are kept aside for runtime resolution
    pub fn register_type(&mut self, type_ref: TypeRef) {
        if type_ref.mapped_types.is_empty() {
            if !self.unmapped.contains(&type_ref) {
                self.unmapped.push(type_ref);
            }
            return;
        }
        for mapped in &type_ref.mapped_types {
            self.handlers
                .insert(mapped.clone(), HandlerBinding::Discovered(type_ref.clone()));
        }
    }

    pub fn handler_for(&self, type_name: &str) -> Option<&HandlerBinding> {
        self.handlers.get(type_name)
    }

    pub fn unmapped(&self) -> &[TypeRef] {
        &self.unmapped
    }

    pub fn len(&self) -> usize {
        self.handlers.len() + self.unmapped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Name of the built-in mapper language
pub const MAPPER_LANGUAGE: &str = "mapper";

/// Built-in language driver; normalizes whitespace in statement text
#[derive(Debug, Default, Clone, Copy)]
pub struct MapperLanguageDriver;

impl LanguageDriver for MapperLanguageDriver {
    fn name(&self) -> &str {
        MAPPER_LANGUAGE
    }

    fn prepare_sql(&self, raw: &str) -> String {
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// Scripting language drivers by name, plus the default
#[derive(Debug, Clone)]
pub struct LanguageDriverRegistry {
    drivers: BTreeMap<String, Arc<dyn LanguageDriver>>,
    default_driver: String,
}

impl Default for LanguageDriverRegistry {
    fn default() -> Self {
        let mut drivers: BTreeMap<String, Arc<dyn LanguageDriver>> = BTreeMap::new();
        drivers.insert(MAPPER_LANGUAGE.to_string(), Arc::new(MapperLanguageDriver));
        Self {
            drivers,
            default_driver: MAPPER_LANGUAGE.to_string(),
        }
    }
}

impl LanguageDriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, driver: Arc<dyn LanguageDriver>) -> SessionResult<()> {
        let name = driver.name().to_string();
        if name.is_empty() {
            return Err(SessionError::registration("language driver without a name"));
        }
        self.drivers.insert(name, driver);
        Ok(())
    }

    /// Make `driver` the default, registering it first if needed
    pub fn set_default(&mut self, driver: Arc<dyn LanguageDriver>) -> SessionResult<()> {
        let name = driver.name().to_string();
        if !self.drivers.contains_key(&name) {
            self.register(driver)?;
        }
        self.default_driver = name;
        Ok(())
    }

    pub fn default_driver(&self) -> Option<&Arc<dyn LanguageDriver>> {
        self.drivers.get(&self.default_driver)
    }

    pub fn default_driver_name(&self) -> &str {
        &self.default_driver
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn LanguageDriver>> {
        self.drivers.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.drivers.keys().map(String::as_str)
    }
}

/// Plugins in registration order
#[derive(Debug, Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, interceptor: Arc<dyn Interceptor>) -> SessionResult<()> {
        if interceptor.name().is_empty() {
            return Err(SessionError::registration("plugin without a name"));
        }
        self.interceptors.push(interceptor);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Interceptor>> {
        self.interceptors.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanning::TypeMetadata;

    #[derive(Debug)]
    struct Handler(&'static str, &'static str);

    impl TypeHandler for Handler {
        fn name(&self) -> &str {
            self.0
        }

        fn mapped_type(&self) -> &str {
            self.1
        }
    }

    #[derive(Debug)]
    struct Driver(&'static str);

    impl LanguageDriver for Driver {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_alias_uses_annotation_or_simple_name() {
        let mut registry = TypeAliasRegistry::new();
        let plain = TypeRef::new(TypeMetadata::class("a.b.User"));
        let annotated = TypeRef::new(TypeMetadata::class("a.b.Order").with_alias("purchase"));

        assert_eq!(registry.register_type(plain).unwrap(), "User");
        assert_eq!(registry.register_type(annotated).unwrap(), "purchase");

        assert_eq!(registry.resolve("user").unwrap().name, "a.b.User");
        assert_eq!(registry.resolve("PURCHASE").unwrap().name, "a.b.Order");
    }

    #[test]
    fn test_later_alias_overwrites() {
        let mut registry = TypeAliasRegistry::new();
        registry
            .register_alias("user", TypeRef::new(TypeMetadata::class("a.User")))
            .unwrap();
        registry
            .register_alias("User", TypeRef::new(TypeMetadata::class("b.User")))
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.resolve("user").unwrap().name, "b.User");
    }

    #[test]
    fn test_blank_alias_is_rejected() {
        let mut registry = TypeAliasRegistry::new();
        let err = registry
            .register_alias(" ", TypeRef::new(TypeMetadata::class("a.User")))
            .unwrap_err();
        assert!(matches!(err, SessionError::Registration { .. }));
    }

    #[test]
    fn test_handler_registration() {
        let mut registry = TypeHandlerRegistry::new();
        registry.register(Arc::new(Handler("first", "a.Money"))).unwrap();
        registry.register(Arc::new(Handler("second", "a.Money"))).unwrap();
        registry.register_type(TypeRef::new(
            TypeMetadata::class("h.UuidHandler").handler_for("a.Uuid"),
        ));
        registry.register_type(TypeRef::new(TypeMetadata::class("h.AnyHandler")));

        assert_eq!(registry.handler_for("a.Money").unwrap().name(), "second");
        assert_eq!(registry.handler_for("a.Uuid").unwrap().name(), "h.UuidHandler");
        assert_eq!(registry.unmapped().len(), 1);
        assert!(registry.register(Arc::new(Handler("bad", ""))).is_err());
    }

    #[test]
    fn test_language_driver_default() {
        let mut registry = LanguageDriverRegistry::new();
        assert_eq!(registry.default_driver_name(), MAPPER_LANGUAGE);

        registry.register(Arc::new(Driver("velocity"))).unwrap();
        assert_eq!(registry.default_driver_name(), MAPPER_LANGUAGE);

        registry.set_default(Arc::new(Driver("freemarker"))).unwrap();
        assert_eq!(registry.default_driver_name(), "freemarker");
        assert!(registry.get("freemarker").is_some());
        assert_eq!(registry.names().count(), 3);
    }

    #[test]
    fn test_mapper_driver_collapses_whitespace() {
        let sql = MapperLanguageDriver.prepare_sql("select *\n   from users\n\twhere id = ?");
        assert_eq!(sql, "select * from users where id = ?");
    }
}
