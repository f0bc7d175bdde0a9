//! Data sources, transaction strategies and the environment that binds them.

use crate::error::BoxError;
use mapforge_core::Properties;
use std::fmt;
use std::sync::Arc;

/// Environment id used when the caller does not name one
pub const DEFAULT_ENVIRONMENT_ID: &str = "ConfigurationAssembler";

/// A source of database connections
pub trait DataSource: fmt::Debug + Send + Sync {
    /// Product name reported by the live database
    fn product_name(&self) -> Result<String, BoxError>;

    /// The wrapped data source, if this is a proxy
    fn target(&self) -> Option<Arc<dyn DataSource>> {
        None
    }
}

/// Proxy that makes a data source aware of externally managed transactions
#[derive(Debug, Clone)]
pub struct TransactionAwareDataSource {
    target: Arc<dyn DataSource>,
}

impl TransactionAwareDataSource {
    pub fn new(target: Arc<dyn DataSource>) -> Self {
        Self { target }
    }
}

impl DataSource for TransactionAwareDataSource {
    fn product_name(&self) -> Result<String, BoxError> {
        self.target.product_name()
    }

    fn target(&self) -> Option<Arc<dyn DataSource>> {
        Some(Arc::clone(&self.target))
    }
}

/// Strips proxies until the innermost data source is reached
pub fn unwrap_data_source(data_source: Arc<dyn DataSource>) -> Arc<dyn DataSource> {
    let mut current = data_source;
    while let Some(target) = current.target() {
        current = target;
    }
    current
}

/// Strategy for creating transactions
pub trait TransactionFactory: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn set_properties(&self, _properties: &Properties) {}
}

/// Transactions owned by the host's transaction manager
#[derive(Debug, Default, Clone, Copy)]
pub struct ManagedTransactionFactory;

impl TransactionFactory for ManagedTransactionFactory {
    fn name(&self) -> &str {
        "managed"
    }
}

/// Named binding of a transaction strategy to a data source
#[derive(Debug, Clone)]
pub struct Environment {
    id: String,
    transaction_factory: Arc<dyn TransactionFactory>,
    data_source: Arc<dyn DataSource>,
}

impl Environment {
    pub fn new(
        id: impl Into<String>,
        transaction_factory: Arc<dyn TransactionFactory>,
        data_source: Arc<dyn DataSource>,
    ) -> Self {
        Self {
            id: id.into(),
            transaction_factory,
            data_source,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn transaction_factory(&self) -> &Arc<dyn TransactionFactory> {
        &self.transaction_factory
    }

    pub fn data_source(&self) -> &Arc<dyn DataSource> {
        &self.data_source
    }
}
