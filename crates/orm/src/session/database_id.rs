//! Database-id providers.

use crate::error::BoxError;
use crate::session::DataSource;
use mapforge_core::Properties;
use std::fmt;

/// Resolves a vendor id for the live data source
pub trait DatabaseIdProvider: fmt::Debug + Send + Sync {
    fn database_id(&self, data_source: &dyn DataSource) -> Result<Option<String>, BoxError>;
}

/// Maps the database product name to an id through a property table.
///
/// A table key matches when the product name contains it. With an empty
/// table the product name itself is the id.
#[derive(Debug, Clone, Default)]
pub struct VendorDatabaseIdProvider {
    properties: Properties,
}

impl VendorDatabaseIdProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_properties(properties: Properties) -> Self {
        Self { properties }
    }

    pub fn with_vendor(mut self, product: &str, id: &str) -> Self {
        self.properties.insert(product, id);
        self
    }
}

impl DatabaseIdProvider for VendorDatabaseIdProvider {
    fn database_id(&self, data_source: &dyn DataSource) -> Result<Option<String>, BoxError> {
        let product = data_source.product_name()?;
        if self.properties.is_empty() {
            return Ok(Some(product));
        }
        Ok(self
            .properties
            .iter()
            .find(|(key, _)| product.contains(key))
            .map(|(_, id)| id.to_string()))
    }
}
