//! Mapped statements produced by mapper parsing.

use std::fmt;

/// One named statement, optionally bound to a database vendor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedStatement {
    pub id: String,
    pub resource: String,
    pub database_id: Option<String>,
    pub language: String,
    pub sql: String,
}

impl MappedStatement {
    pub fn new(id: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resource: String::new(),
            database_id: None,
            language: crate::session::MAPPER_LANGUAGE.to_string(),
            sql: sql.into(),
        }
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    pub fn with_database_id(mut self, database_id: impl Into<String>) -> Self {
        self.database_id = Some(database_id.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = sql.into();
        self
    }

    /// Namespace part of a dotted id
    pub fn namespace(&self) -> Option<&str> {
        self.id.rsplit_once('.').map(|(namespace, _)| namespace)
    }
}

impl fmt::Display for MappedStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.database_id {
            Some(database_id) => write!(f, "{} [{}]", self.id, database_id),
            None => write!(f, "{}", self.id),
        }
    }
}
