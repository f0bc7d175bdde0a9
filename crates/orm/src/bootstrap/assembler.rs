//! Orchestrates the assembly of a session factory from all of its sources.

use crate::bootstrap::{
    rewrite_statements, DefaultFactoryBuilder, DescriptorParser, FactoryBuilder, KeywordCaseRewriter,
    MapperLoader, RegistrationPipeline, ScanRequest, SessionFactory, SourceResolver, StatementRewriter,
};
use crate::error::{SessionError, SessionResult};
use crate::resource::{resolve_resources, ResourceRef};
use crate::scanning::{global_type_index, ResourceScanner, TypeIndex, TypeRef};
use crate::session::{
    unwrap_data_source, Cache, DataSource, DatabaseIdProvider, Environment, Interceptor,
    LanguageDriver, ManagedTransactionFactory, MapperLanguageDriver, ObjectFactory,
    ObjectWrapperFactory, SessionConfiguration, TransactionFactory, TypeHandler, Vfs,
    DEFAULT_ENVIRONMENT_ID,
};
use mapforge_core::{
    keys, targets, ColumnStyle, LifecycleManager, LifecycleState, MapperSettings, Properties,
    SettingsTrait,
};
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::Arc;

/// Builds a [`SessionFactory`] once from the configured sources.
///
/// Setters take `&mut self` and discard any factory built so far; `build`
/// and `finalize` take `&self` so an assembler can be shared between threads
/// racing for the factory.
#[derive(Debug)]
pub struct ConfigurationAssembler {
    configuration: Option<SessionConfiguration>,
    config_location: Option<ResourceRef>,
    mapper_locations: Option<Vec<Option<ResourceRef>>>,
    configuration_properties: Properties,
    data_source: Option<Arc<dyn DataSource>>,
    transaction_factory: Option<Arc<dyn TransactionFactory>>,
    environment: String,
    factory_builder: Option<Arc<dyn FactoryBuilder>>,
    parser: Option<Arc<dyn DescriptorParser>>,
    object_factory: Option<Arc<dyn ObjectFactory>>,
    object_wrapper_factory: Option<Arc<dyn ObjectWrapperFactory>>,
    vfs: Option<Arc<dyn Vfs>>,
    type_aliases: Vec<TypeRef>,
    type_aliases_scan: Option<ScanRequest>,
    type_handlers: Vec<Arc<dyn TypeHandler>>,
    type_handlers_scan: Option<ScanRequest>,
    plugins: Vec<Arc<dyn Interceptor>>,
    scripting_language_drivers: Vec<Arc<dyn LanguageDriver>>,
    default_scripting_language_driver: Option<Arc<dyn LanguageDriver>>,
    database_id_provider: Option<Arc<dyn DatabaseIdProvider>>,
    cache: Option<Arc<dyn Cache>>,
    statement_rewriters: Vec<Arc<dyn StatementRewriter>>,
    type_index: Arc<dyn TypeIndex>,
    lifecycle: LifecycleManager,
    factory: OnceCell<Arc<SessionFactory>>,
}

impl Default for ConfigurationAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationAssembler {
    pub fn new() -> Self {
        Self {
            configuration: None,
            config_location: None,
            mapper_locations: None,
            configuration_properties: Properties::new(),
            data_source: None,
            transaction_factory: None,
            environment: DEFAULT_ENVIRONMENT_ID.to_string(),
            factory_builder: Some(Arc::new(DefaultFactoryBuilder)),
            parser: None,
            object_factory: None,
            object_wrapper_factory: None,
            vfs: None,
            type_aliases: Vec::new(),
            type_aliases_scan: None,
            type_handlers: Vec::new(),
            type_handlers_scan: None,
            plugins: Vec::new(),
            scripting_language_drivers: Vec::new(),
            default_scripting_language_driver: None,
            database_id_provider: None,
            cache: None,
            statement_rewriters: Vec::new(),
            type_index: global_type_index(),
            lifecycle: LifecycleManager::new("ConfigurationAssembler"),
            factory: OnceCell::new(),
        }
    }

    fn invalidate(&mut self) {
        self.factory = OnceCell::new();
        self.lifecycle.reset();
    }

    pub fn set_configuration(&mut self, configuration: SessionConfiguration) {
        self.configuration = Some(configuration);
        self.invalidate();
    }

    pub fn set_config_location(&mut self, resource: ResourceRef) {
        self.config_location = Some(resource);
        self.invalidate();
    }

    /// Ordered mapper resources; `None` entries are skipped during loading
    pub fn set_mapper_locations(&mut self, mappers: Vec<Option<ResourceRef>>) {
        self.mapper_locations = Some(mappers);
        self.invalidate();
    }

    /// Mapper resources matching `pattern` under `root`, in path order
    pub fn set_mapper_locations_pattern(&mut self, root: &Path, pattern: &str) -> SessionResult<()> {
        let resources = resolve_resources(root, pattern).map_err(|e| SessionError::Scan {
            pattern: pattern.to_string(),
            source: Box::new(e),
        })?;
        self.set_mapper_locations(resources.into_iter().map(Some).collect());
        Ok(())
    }

    pub fn set_configuration_properties(&mut self, properties: Properties) {
        self.configuration_properties = properties;
        self.invalidate();
    }

    pub fn configuration_properties(&self) -> &Properties {
        &self.configuration_properties
    }

    pub fn set_data_source(&mut self, data_source: Arc<dyn DataSource>) {
        self.data_source = Some(data_source);
        self.invalidate();
    }

    pub fn set_transaction_factory(&mut self, transaction_factory: Arc<dyn TransactionFactory>) {
        self.transaction_factory = Some(transaction_factory);
        self.invalidate();
    }

    pub fn set_environment(&mut self, environment: impl Into<String>) {
        self.environment = environment.into();
        self.invalidate();
    }

    pub fn set_factory_builder(&mut self, builder: Option<Arc<dyn FactoryBuilder>>) {
        self.factory_builder = builder;
        self.invalidate();
    }

    pub fn set_descriptor_parser(&mut self, parser: Arc<dyn DescriptorParser>) {
        self.parser = Some(parser);
        self.invalidate();
    }

    pub fn set_object_factory(&mut self, factory: Arc<dyn ObjectFactory>) {
        self.object_factory = Some(factory);
        self.invalidate();
    }

    pub fn set_object_wrapper_factory(&mut self, factory: Arc<dyn ObjectWrapperFactory>) {
        self.object_wrapper_factory = Some(factory);
        self.invalidate();
    }

    pub fn set_vfs(&mut self, vfs: Arc<dyn Vfs>) {
        self.vfs = Some(vfs);
        self.invalidate();
    }

    pub fn set_type_aliases(&mut self, aliases: Vec<TypeRef>) {
        self.type_aliases = aliases;
        self.invalidate();
    }

    pub fn set_type_aliases_package(&mut self, packages: impl Into<String>) {
        let supertype = self.type_aliases_scan.take().and_then(|scan| scan.supertype);
        self.type_aliases_scan = Some(ScanRequest {
            packages: packages.into(),
            supertype,
        });
        self.invalidate();
    }

    /// Only scanned aliases assignable to `supertype` are registered
    pub fn set_type_aliases_super_type(&mut self, supertype: impl Into<String>) {
        let mut scan = self.type_aliases_scan.take().unwrap_or_default();
        scan.supertype = Some(supertype.into());
        self.type_aliases_scan = Some(scan);
        self.invalidate();
    }

    pub fn set_type_handlers(&mut self, handlers: Vec<Arc<dyn TypeHandler>>) {
        self.type_handlers = handlers;
        self.invalidate();
    }

    pub fn set_type_handlers_package(&mut self, packages: impl Into<String>) {
        self.type_handlers_scan = Some(ScanRequest::new(packages));
        self.invalidate();
    }

    pub fn set_plugins(&mut self, plugins: Vec<Arc<dyn Interceptor>>) {
        self.plugins = plugins;
        self.invalidate();
    }

    pub fn set_scripting_language_drivers(&mut self, drivers: Vec<Arc<dyn LanguageDriver>>) {
        self.scripting_language_drivers = drivers;
        self.invalidate();
    }

    pub fn set_default_scripting_language_driver(&mut self, driver: Arc<dyn LanguageDriver>) {
        self.default_scripting_language_driver = Some(driver);
        self.invalidate();
    }

    pub fn set_database_id_provider(&mut self, provider: Arc<dyn DatabaseIdProvider>) {
        self.database_id_provider = Some(provider);
        self.invalidate();
    }

    pub fn set_cache(&mut self, cache: Arc<dyn Cache>) {
        self.cache = Some(cache);
        self.invalidate();
    }

    pub fn add_statement_rewriter(&mut self, rewriter: Arc<dyn StatementRewriter>) {
        self.statement_rewriters.push(rewriter);
        self.invalidate();
    }

    /// Index used for package scanning; defaults to the process-wide index
    pub fn set_type_index(&mut self, index: Arc<dyn TypeIndex>) {
        self.type_index = index;
        self.invalidate();
    }

    fn set_flag(&mut self, key: &str, value: impl ToString) {
        self.configuration_properties.insert(key, value);
        self.invalidate();
    }

    pub fn set_enable_logger(&mut self, enabled: bool) {
        self.set_flag(keys::ENABLE_LOGGER, enabled);
    }

    pub fn set_enable_mapper_scan_log(&mut self, enabled: bool) {
        self.set_flag(keys::ENABLE_MAPPER_SCAN_LOG, enabled);
    }

    pub fn set_enable_runtime_log(&mut self, enabled: bool) {
        self.set_flag(keys::ENABLE_RUNTIME_LOG, enabled);
    }

    pub fn set_enable_compilation_log(&mut self, enabled: bool) {
        self.set_flag(keys::ENABLE_COMPILATION_LOG, enabled);
    }

    pub fn set_enable_keywords_to_uppercase(&mut self, enabled: bool) {
        self.set_flag(keys::ENABLE_KEYWORDS_TO_UPPERCASE, enabled);
    }

    pub fn set_database_column_style(&mut self, style: ColumnStyle) {
        self.set_flag(keys::DATABASE_COLUMN_STYLE, style);
    }

    pub fn set_enable_xml_syntax_parsing(&mut self, enabled: bool) {
        self.set_flag(keys::ENABLE_XML_SYNTAX_PARSING, enabled);
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// The factory, if one has been built since the last source change
    pub fn factory(&self) -> Option<Arc<SessionFactory>> {
        self.factory.get().cloned()
    }

    /// Build the factory, or return the one already built.
    ///
    /// Concurrent first callers block until a single assembly completes. A
    /// failed build leaves nothing cached, so a later call tries again.
    pub fn build(&self) -> SessionResult<Arc<SessionFactory>> {
        self.factory
            .get_or_try_init(|| -> SessionResult<Arc<SessionFactory>> {
                let inputs = self.validate()?;
                self.lifecycle.transition(LifecycleState::Building)?;
                match self.assemble(inputs) {
                    Ok(factory) => {
                        self.lifecycle.transition(LifecycleState::Built)?;
                        Ok(Arc::new(factory))
                    }
                    Err(e) => {
                        tracing::error!("Failed to build session factory: {}", e);
                        self.lifecycle.transition(LifecycleState::Failed)?;
                        Err(e)
                    }
                }
            })
            .map(Arc::clone)
    }

    fn validate(&self) -> SessionResult<Inputs<'_>> {
        let data_source = self
            .data_source
            .as_ref()
            .ok_or_else(|| SessionError::missing_required("dataSource"))?;
        let factory_builder = self
            .factory_builder
            .as_deref()
            .ok_or_else(|| SessionError::missing_required("factoryBuilder"))?;
        if self.configuration.is_some() && self.config_location.is_some() {
            return Err(SessionError::ConfigConflict);
        }

        let needs_parser = self.config_location.is_some()
            || self
                .mapper_locations
                .as_ref()
                .is_some_and(|mappers| mappers.iter().any(Option::is_some));
        let parser = match (&self.parser, needs_parser) {
            (Some(parser), _) => Some(Arc::as_ref(parser)),
            (None, true) => return Err(SessionError::missing_required("descriptorParser")),
            (None, false) => None,
        };

        MapperSettings::from_properties(&self.configuration_properties)?;

        Ok(Inputs {
            data_source: unwrap_data_source(Arc::clone(data_source)),
            factory_builder,
            parser,
        })
    }

    fn assemble(&self, inputs: Inputs<'_>) -> SessionResult<SessionFactory> {
        // 1. base configuration; any descriptor parse is deferred
        let (mut configuration, pending) = SourceResolver::resolve(
            self.configuration.clone(),
            self.config_location.clone(),
            &self.configuration_properties,
        )?;
        if !configuration.has_explicit_settings() {
            let settings = MapperSettings::from_properties(configuration.variables())?;
            configuration.apply_derived_settings(settings);
        }
        let scanner = ResourceScanner::new(Arc::clone(&self.type_index))
            .with_scan_log(configuration.settings().scan_log_enabled());
        let pipeline = RegistrationPipeline::new(&scanner);

        // 2. factories and vfs
        if let Some(factory) = &self.object_factory {
            configuration.set_object_factory(Arc::clone(factory));
        }
        if let Some(factory) = &self.object_wrapper_factory {
            configuration.set_object_wrapper_factory(Arc::clone(factory));
        }
        if let Some(vfs) = &self.vfs {
            configuration.set_vfs(Arc::clone(vfs));
        }

        // 3-6. pre-parse registrations
        pipeline.apply_aliases(&mut configuration, &self.type_aliases, self.type_aliases_scan.as_ref())?;
        pipeline.apply_plugins(&mut configuration, &self.plugins)?;
        pipeline.apply_handlers(&mut configuration, &self.type_handlers, self.type_handlers_scan.as_ref())?;
        pipeline.apply_drivers(&mut configuration, &self.scripting_language_drivers)?;

        // 7. database id must be known before anything is parsed
        if let Some(provider) = &self.database_id_provider {
            let database_id = provider
                .database_id(inputs.data_source.as_ref())
                .map_err(|source| SessionError::DatabaseIdLookupFailure { source })?;
            tracing::debug!("Resolved database id: {:?}", database_id);
            configuration.set_database_id(database_id);
        }

        // 8. cache
        pipeline.apply_cache(&mut configuration, self.cache.as_ref())?;

        // 9. descriptor
        if let Some(pending) = pending {
            let parser = inputs
                .parser
                .ok_or_else(|| SessionError::missing_required("descriptorParser"))?;
            pending.execute(parser, &mut configuration)?;
        }

        // 10. default driver; must follow the descriptor parse
        if configuration.settings().enable_xml_syntax_parsing {
            configuration
                .language_drivers_mut()
                .set_default(Arc::new(MapperLanguageDriver))?;
        } else if let Some(driver) = &self.default_scripting_language_driver {
            configuration.language_drivers_mut().set_default(Arc::clone(driver))?;
        }

        // 11. environment
        let transaction_factory = self
            .transaction_factory
            .clone()
            .unwrap_or_else(|| Arc::new(ManagedTransactionFactory));
        configuration.set_environment(Environment::new(
            self.environment.clone(),
            transaction_factory,
            Arc::clone(&inputs.data_source),
        ));

        // 12. mappers
        MapperLoader::new(inputs.parser).load(&mut configuration, self.mapper_locations.as_deref())?;

        // 13. freeze
        let bootstrap_log = configuration.settings().bootstrap_log_enabled();
        let factory = inputs.factory_builder.build(configuration);
        if bootstrap_log {
            tracing::info!(
                target: targets::BOOTSTRAP,
                "Built session factory {} ({} mapped statements, database id {:?})",
                factory.id(),
                factory.configuration().mapped_statement_count(),
                factory.database_id()
            );
        }
        Ok(factory)
    }

    /// Apply deferred statement rewriting to the built factory.
    ///
    /// Fails unless `build` has completed; may only run once per build.
    pub fn finalize(&self) -> SessionResult<()> {
        self.lifecycle.transition(LifecycleState::Finalized)?;
        let factory = self
            .factory()
            .ok_or_else(|| SessionError::missing_required("sessionFactory"))?;
        let configuration = factory.configuration();
        let settings = configuration.settings();

        if settings.bootstrap_log_enabled() {
            tracing::info!(target: targets::BOOTSTRAP, "Bootstrapping session factory {}", factory.id());
        }

        let mut rewriters: Vec<&dyn StatementRewriter> = Vec::new();
        if settings.enable_keywords_to_uppercase {
            rewriters.push(&KeywordCaseRewriter);
        }
        rewriters.extend(self.statement_rewriters.iter().map(Arc::as_ref));

        let statements = rewrite_statements(configuration, &rewriters);
        if settings.compilation_log_enabled() {
            for statement in statements.values() {
                tracing::info!(target: targets::COMPILATION, "{}: {}", statement, statement.sql);
            }
        }
        if !factory.install_rewrites(statements) {
            return Err(SessionError::registration("session factory is already finalized"));
        }

        if settings.bootstrap_log_enabled() {
            tracing::info!(
                target: targets::BOOTSTRAP,
                "Loaded {} mapped statements from {} resources",
                configuration.mapped_statement_count(),
                configuration.loaded_resources().count()
            );
        }
        if settings.runtime_log_enabled() {
            tracing::info!(target: targets::RUNTIME, "Session factory {} is ready", factory.id());
        }
        Ok(())
    }
}

struct Inputs<'a> {
    data_source: Arc<dyn DataSource>,
    factory_builder: &'a dyn FactoryBuilder,
    parser: Option<&'a dyn DescriptorParser>,
}
