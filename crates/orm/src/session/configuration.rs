//! The mutable accumulator a session factory is built from.

use crate::error::{SessionError, SessionResult};
use crate::session::{
    Cache, DefaultObjectFactory, DefaultObjectWrapperFactory, Environment, InterceptorChain,
    LanguageDriverRegistry, MappedStatement, ObjectFactory, ObjectWrapperFactory,
    TypeAliasRegistry, TypeHandlerRegistry, Vfs,
};
use mapforge_core::{MapperSettings, Properties};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Everything registered for a session factory.
///
/// Built by a single owner and moved into the factory once complete; there
/// is no way to mutate it after that.
#[derive(Debug, Clone)]
pub struct SessionConfiguration {
    object_factory: Arc<dyn ObjectFactory>,
    object_wrapper_factory: Arc<dyn ObjectWrapperFactory>,
    vfs: Option<Arc<dyn Vfs>>,
    database_id: Option<String>,
    caches: BTreeMap<String, Arc<dyn Cache>>,
    type_aliases: TypeAliasRegistry,
    type_handlers: TypeHandlerRegistry,
    language_drivers: LanguageDriverRegistry,
    interceptors: InterceptorChain,
    environment: Option<Environment>,
    variables: Properties,
    settings: MapperSettings,
    settings_set: bool,
    mapped_statements: BTreeMap<String, MappedStatement>,
    sql_fragments: HashMap<String, String>,
    loaded_resources: BTreeSet<String>,
}

impl Default for SessionConfiguration {
    fn default() -> Self {
        Self {
            object_factory: Arc::new(DefaultObjectFactory),
            object_wrapper_factory: Arc::new(DefaultObjectWrapperFactory),
            vfs: None,
            database_id: None,
            caches: BTreeMap::new(),
            type_aliases: TypeAliasRegistry::new(),
            type_handlers: TypeHandlerRegistry::new(),
            language_drivers: LanguageDriverRegistry::new(),
            interceptors: InterceptorChain::new(),
            environment: None,
            variables: Properties::new(),
            settings: MapperSettings::default(),
            settings_set: false,
            mapped_statements: BTreeMap::new(),
            sql_fragments: HashMap::new(),
            loaded_resources: BTreeSet::new(),
        }
    }
}

impl SessionConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object_factory(&self) -> &Arc<dyn ObjectFactory> {
        &self.object_factory
    }

    pub fn set_object_factory(&mut self, factory: Arc<dyn ObjectFactory>) {
        self.object_factory = factory;
    }

    pub fn object_wrapper_factory(&self) -> &Arc<dyn ObjectWrapperFactory> {
        &self.object_wrapper_factory
    }

    pub fn set_object_wrapper_factory(&mut self, factory: Arc<dyn ObjectWrapperFactory>) {
        self.object_wrapper_factory = factory;
    }

    pub fn vfs(&self) -> Option<&Arc<dyn Vfs>> {
        self.vfs.as_ref()
    }

    pub fn set_vfs(&mut self, vfs: Arc<dyn Vfs>) {
        self.vfs = Some(vfs);
    }

    pub fn database_id(&self) -> Option<&str> {
        self.database_id.as_deref()
    }

    pub fn set_database_id(&mut self, database_id: Option<String>) {
        self.database_id = database_id;
    }

    /// Register a cache; ids are unique
    pub fn add_cache(&mut self, cache: Arc<dyn Cache>) -> SessionResult<()> {
        let id = cache.id().to_string();
        if self.caches.contains_key(&id) {
            return Err(SessionError::registration(format!(
                "cache '{}' is already registered",
                id
            )));
        }
        self.caches.insert(id, cache);
        Ok(())
    }

    pub fn cache(&self, id: &str) -> Option<&Arc<dyn Cache>> {
        self.caches.get(id)
    }

    pub fn cache_ids(&self) -> impl Iterator<Item = &str> {
        self.caches.keys().map(String::as_str)
    }

    pub fn type_aliases(&self) -> &TypeAliasRegistry {
        &self.type_aliases
    }

    pub fn type_aliases_mut(&mut self) -> &mut TypeAliasRegistry {
        &mut self.type_aliases
    }

    pub fn type_handlers(&self) -> &TypeHandlerRegistry {
        &self.type_handlers
    }

    pub fn type_handlers_mut(&mut self) -> &mut TypeHandlerRegistry {
        &mut self.type_handlers
    }

    pub fn language_drivers(&self) -> &LanguageDriverRegistry {
        &self.language_drivers
    }

    pub fn language_drivers_mut(&mut self) -> &mut LanguageDriverRegistry {
        &mut self.language_drivers
    }

    pub fn interceptors(&self) -> &InterceptorChain {
        &self.interceptors
    }

    pub fn interceptors_mut(&mut self) -> &mut InterceptorChain {
        &mut self.interceptors
    }

    pub fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    pub fn set_environment(&mut self, environment: Environment) {
        self.environment = Some(environment);
    }

    /// Placeholder variables visible to descriptor and mapper parsing
    pub fn variables(&self) -> &Properties {
        &self.variables
    }

    pub fn set_variables(&mut self, variables: Properties) {
        self.variables = variables;
    }

    /// Merge `overrides` into the variables; overrides win on collision
    pub fn merge_variables(&mut self, overrides: &Properties) {
        self.variables.merge(overrides);
    }

    pub fn settings(&self) -> &MapperSettings {
        &self.settings
    }

    /// Set the settings directly; the assembler will not re-derive them
    /// from the variables
    pub fn set_settings(&mut self, settings: MapperSettings) {
        self.settings = settings;
        self.settings_set = true;
    }

    /// Whether the settings were set with [`Self::set_settings`]
    pub fn has_explicit_settings(&self) -> bool {
        self.settings_set
    }

    pub(crate) fn apply_derived_settings(&mut self, settings: MapperSettings) {
        self.settings = settings;
    }

    /// Column name for a property under the configured column style
    pub fn column_name(&self, property: &str) -> String {
        self.settings.database_column_style.apply(property)
    }

    /// Add a statement, honouring database-id variants.
    ///
    /// A statement bound to another database id is skipped. A statement bound
    /// to the current id replaces an unbound statement with the same id, and
    /// an unbound statement never replaces a bound one. Returns whether the
    /// statement was kept.
    pub fn add_mapped_statement(&mut self, statement: MappedStatement) -> SessionResult<bool> {
        if let Some(required) = statement.database_id.as_deref() {
            if self.database_id.as_deref() != Some(required) {
                tracing::trace!("Skipping {} for database id {:?}", statement, self.database_id);
                return Ok(false);
            }
        }

        if let Some(existing) = self.mapped_statements.get(&statement.id) {
            match (&existing.database_id, &statement.database_id) {
                (Some(_), None) => return Ok(false),
                (None, Some(_)) => {}
                _ => {
                    return Err(SessionError::registration(format!(
                        "mapped statement '{}' is already defined in '{}'",
                        statement.id, existing.resource
                    )))
                }
            }
        }

        self.mapped_statements.insert(statement.id.clone(), statement);
        Ok(true)
    }

    pub fn mapped_statement(&self, id: &str) -> Option<&MappedStatement> {
        self.mapped_statements.get(id)
    }

    pub fn mapped_statements(&self) -> impl Iterator<Item = &MappedStatement> {
        self.mapped_statements.values()
    }

    pub fn mapped_statement_count(&self) -> usize {
        self.mapped_statements.len()
    }

    pub fn add_sql_fragment(&mut self, id: impl Into<String>, sql: impl Into<String>) {
        self.sql_fragments.insert(id.into(), sql.into());
    }

    pub fn sql_fragment(&self, id: &str) -> Option<&str> {
        self.sql_fragments.get(id).map(String::as_str)
    }

    pub fn add_loaded_resource(&mut self, resource: impl Into<String>) {
        self.loaded_resources.insert(resource.into());
    }

    pub fn is_resource_loaded(&self, resource: &str) -> bool {
        self.loaded_resources.contains(resource)
    }

    pub fn loaded_resources(&self) -> impl Iterator<Item = &str> {
        self.loaded_resources.iter().map(String::as_str)
    }
}
