//! Pluggable session components registered on a configuration.

use dashmap::DashMap;
use mapforge_core::Properties;
use std::fmt;
use std::io;

/// Creates result objects by type name
pub trait ObjectFactory: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn set_properties(&self, _properties: &Properties) {}
}

/// Decides which result types get a custom wrapper
pub trait ObjectWrapperFactory: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn has_wrapper_for(&self, _type_name: &str) -> bool {
        false
    }
}

/// Virtual filesystem used to list resources under a path
pub trait Vfs: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn list(&self, path: &str) -> io::Result<Vec<String>>;
}

/// Plugin that intercepts statement execution
pub trait Interceptor: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn set_properties(&self, _properties: &Properties) {}
}

/// Converts values of one mapped type between the host and the database
pub trait TypeHandler: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Fully-qualified name of the handled type
    fn mapped_type(&self) -> &str;
}

/// Scripting language used to turn mapper text into statement SQL
pub trait LanguageDriver: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn prepare_sql(&self, raw: &str) -> String {
        raw.to_string()
    }
}

/// Second-level statement cache
pub trait Cache: fmt::Debug + Send + Sync {
    fn id(&self) -> &str;

    fn get(&self, key: &str) -> Option<String>;

    fn put(&self, key: &str, value: String);

    fn clear(&self);

    fn size(&self) -> usize;
}

#[derive(Debug, Default)]
pub struct DefaultObjectFactory;

impl ObjectFactory for DefaultObjectFactory {
    fn name(&self) -> &str {
        "default"
    }
}

#[derive(Debug, Default)]
pub struct DefaultObjectWrapperFactory;

impl ObjectWrapperFactory for DefaultObjectWrapperFactory {
    fn name(&self) -> &str {
        "default"
    }
}

/// Unbounded in-memory cache
#[derive(Debug)]
pub struct PerpetualCache {
    id: String,
    entries: DashMap<String, String>,
}

impl PerpetualCache {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entries: DashMap::new(),
        }
    }
}

impl Cache for PerpetualCache {
    fn id(&self) -> &str {
        &self.id
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    fn put(&self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn clear(&self) {
        self.entries.clear();
    }

    fn size(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perpetual_cache() {
        let cache = PerpetualCache::new("users");
        assert_eq!(cache.id(), "users");
        assert_eq!(cache.get("k"), None);

        cache.put("k", "v".to_string());
        assert_eq!(cache.get("k").as_deref(), Some("v"));
        assert_eq!(cache.size(), 1);

        cache.clear();
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_default_factories() {
        assert_eq!(DefaultObjectFactory.name(), "default");
        assert!(!DefaultObjectWrapperFactory.has_wrapper_for("a.b.User"));
    }
}
