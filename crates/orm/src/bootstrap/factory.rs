//! The frozen session factory and the builder that produces it.

use crate::session::{MappedStatement, SessionConfiguration};
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Freezes a finished configuration into a factory
pub trait FactoryBuilder: fmt::Debug + Send + Sync {
    fn build(&self, configuration: SessionConfiguration) -> SessionFactory;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFactoryBuilder;

impl FactoryBuilder for DefaultFactoryBuilder {
    fn build(&self, configuration: SessionConfiguration) -> SessionFactory {
        SessionFactory::new(configuration)
    }
}

/// Immutable product of a successful build, shared across consumers
pub struct SessionFactory {
    id: Uuid,
    built_at: DateTime<Utc>,
    configuration: SessionConfiguration,
    rewritten: OnceCell<BTreeMap<String, MappedStatement>>,
}

impl SessionFactory {
    pub fn new(configuration: SessionConfiguration) -> Self {
        Self {
            id: Uuid::new_v4(),
            built_at: Utc::now(),
            configuration,
            rewritten: OnceCell::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn configuration(&self) -> &SessionConfiguration {
        &self.configuration
    }

    pub fn database_id(&self) -> Option<&str> {
        self.configuration.database_id()
    }

    /// Statement by id, preferring the finalized rewrite
    pub fn mapped_statement(&self, id: &str) -> Option<&MappedStatement> {
        self.rewritten
            .get()
            .and_then(|rewritten| rewritten.get(id))
            .or_else(|| self.configuration.mapped_statement(id))
    }

    pub fn is_finalized(&self) -> bool {
        self.rewritten.get().is_some()
    }

    /// Install finalized statements; returns false if already installed
    pub(crate) fn install_rewrites(&self, statements: BTreeMap<String, MappedStatement>) -> bool {
        self.rewritten.set(statements).is_ok()
    }
}

impl fmt::Debug for SessionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionFactory")
            .field("id", &self.id)
            .field("built_at", &self.built_at)
            .field("database_id", &self.configuration.database_id())
            .field("statements", &self.configuration.mapped_statement_count())
            .field("finalized", &self.is_finalized())
            .finish()
    }
}
