//! Applying explicit and discovered registrations to a configuration.

use crate::error::SessionResult;
use crate::scanning::{ResourceScanner, TypeFilter, TypeRef};
use crate::session::{Cache, Interceptor, LanguageDriver, SessionConfiguration, TypeHandler};
use std::sync::Arc;

/// Package scan half of a registration request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanRequest {
    pub packages: String,
    pub supertype: Option<String>,
}

impl ScanRequest {
    pub fn new(packages: impl Into<String>) -> Self {
        Self {
            packages: packages.into(),
            supertype: None,
        }
    }

    pub fn with_supertype(mut self, supertype: impl Into<String>) -> Self {
        self.supertype = Some(supertype.into());
        self
    }

    fn filter(&self, base: TypeFilter) -> TypeFilter {
        match &self.supertype {
            Some(supertype) => base.and(TypeFilter::assignable_to(supertype.clone())),
            None => base,
        }
    }
}

/// Registers aliases, handlers, plugins, drivers and caches.
///
/// Explicit lists are applied in order so that later duplicates win.
/// Discovered types come from a set and have no defined order.
#[derive(Debug)]
pub struct RegistrationPipeline<'a> {
    scanner: &'a ResourceScanner,
}

impl<'a> RegistrationPipeline<'a> {
    pub fn new(scanner: &'a ResourceScanner) -> Self {
        Self { scanner }
    }

    pub fn apply_aliases(
        &self,
        configuration: &mut SessionConfiguration,
        explicit: &[TypeRef],
        scan: Option<&ScanRequest>,
    ) -> SessionResult<()> {
        if let Some(request) = scan {
            let discovered = self
                .scanner
                .scan(&request.packages, &request.filter(TypeFilter::aliasable()))?;
            for type_ref in discovered.into_types() {
                let type_name = type_ref.to_string();
                let alias = configuration.type_aliases_mut().register_type(type_ref)?;
                tracing::debug!("Registered scanned type alias: '{}' -> '{}'", alias, type_name);
            }
        }
        for type_ref in explicit {
            let alias = configuration.type_aliases_mut().register_type(type_ref.clone())?;
            tracing::debug!("Registered type alias: '{}' -> '{}'", alias, type_ref);
        }
        Ok(())
    }

    pub fn apply_plugins(
        &self,
        configuration: &mut SessionConfiguration,
        plugins: &[Arc<dyn Interceptor>],
    ) -> SessionResult<()> {
        for plugin in plugins {
            configuration.interceptors_mut().add(Arc::clone(plugin))?;
            tracing::debug!("Registered plugin: '{}'", plugin.name());
        }
        Ok(())
    }

    pub fn apply_handlers(
        &self,
        configuration: &mut SessionConfiguration,
        explicit: &[Arc<dyn TypeHandler>],
        scan: Option<&ScanRequest>,
    ) -> SessionResult<()> {
        if let Some(request) = scan {
            let discovered = self
                .scanner
                .scan(&request.packages, &request.filter(TypeFilter::concrete_handler()))?;
            for type_ref in discovered.into_types() {
                tracing::debug!("Registered scanned type handler: '{}'", type_ref);
                configuration.type_handlers_mut().register_type(type_ref);
            }
        }
        for handler in explicit {
            configuration.type_handlers_mut().register(Arc::clone(handler))?;
            tracing::debug!("Registered type handler: '{}'", handler.name());
        }
        Ok(())
    }

    /// Register auxiliary drivers; the default driver is left alone
    pub fn apply_drivers(
        &self,
        configuration: &mut SessionConfiguration,
        drivers: &[Arc<dyn LanguageDriver>],
    ) -> SessionResult<()> {
        for driver in drivers {
            configuration.language_drivers_mut().register(Arc::clone(driver))?;
            tracing::debug!("Registered scripting language driver: '{}'", driver.name());
        }
        Ok(())
    }

    pub fn apply_cache(
        &self,
        configuration: &mut SessionConfiguration,
        cache: Option<&Arc<dyn Cache>>,
    ) -> SessionResult<()> {
        if let Some(cache) = cache {
            configuration.add_cache(Arc::clone(cache))?;
            tracing::debug!("Registered cache: '{}'", cache.id());
        }
        Ok(())
    }
}
