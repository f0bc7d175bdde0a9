//! Type index: the searchable set of types a process can discover.
//!
//! Rust has no runtime class path, so discoverable types are registered up
//! front. The index hands out cheap metadata first and only resolves a type
//! fully when asked to `load` it.

use crate::error::BoxError;
use crate::scanning::{ResourceEntry, TypeMetadata, TypeRef};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

/// Resolves a type from its metadata
pub type TypeLoader = Arc<dyn Fn(&TypeMetadata) -> Result<TypeRef, BoxError> + Send + Sync>;

/// A searchable collection of types
pub trait TypeIndex: fmt::Debug + Send + Sync {
    /// Every entry in the index
    fn entries(&self) -> Result<Vec<ResourceEntry>, BoxError>;

    /// Read metadata for an entry without loading the type
    fn read_metadata(&self, entry: &ResourceEntry) -> Result<TypeMetadata, BoxError>;

    /// Fully resolve a type
    fn load(&self, metadata: &TypeMetadata) -> Result<TypeRef, BoxError>;
}

enum IndexedType {
    Readable {
        metadata: TypeMetadata,
        loader: Option<TypeLoader>,
    },
    Unreadable {
        reason: String,
    },
}

/// In-process type index populated by registration
pub struct StaticTypeIndex {
    types: RwLock<BTreeMap<String, IndexedType>>,
    loads: AtomicUsize,
}

impl StaticTypeIndex {
    pub fn new() -> Self {
        Self {
            types: RwLock::new(BTreeMap::new()),
            loads: AtomicUsize::new(0),
        }
    }

    /// Register a type that loads from its own metadata
    pub fn register(&self, metadata: TypeMetadata) {
        self.insert(
            ResourceEntry::for_type(&metadata.name),
            IndexedType::Readable {
                metadata,
                loader: None,
            },
        );
    }

    /// Register a type with a custom loader
    pub fn register_with_loader(
        &self,
        metadata: TypeMetadata,
        loader: impl Fn(&TypeMetadata) -> Result<TypeRef, BoxError> + Send + Sync + 'static,
    ) {
        self.insert(
            ResourceEntry::for_type(&metadata.name),
            IndexedType::Readable {
                metadata,
                loader: Some(Arc::new(loader)),
            },
        );
    }

    /// Register an entry whose metadata cannot be read
    pub fn register_unreadable(&self, type_name: &str, reason: impl Into<String>) {
        self.insert(
            ResourceEntry::for_type(type_name),
            IndexedType::Unreadable {
                reason: reason.into(),
            },
        );
    }

    pub fn count(&self) -> usize {
        self.read().len()
    }

    pub fn is_registered(&self, type_name: &str) -> bool {
        self.read()
            .contains_key(ResourceEntry::for_type(type_name).location())
    }

    /// How many `load` calls this index has served
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    fn insert(&self, entry: ResourceEntry, indexed: IndexedType) {
        let mut types = self
            .types
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if types.insert(entry.location().to_string(), indexed).is_some() {
            tracing::debug!("Replaced indexed type: {}", entry);
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, IndexedType>> {
        self.types
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for StaticTypeIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StaticTypeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTypeIndex")
            .field("types", &self.count())
            .field("loads", &self.load_count())
            .finish()
    }
}

impl TypeIndex for StaticTypeIndex {
    fn entries(&self) -> Result<Vec<ResourceEntry>, BoxError> {
        Ok(self.read().keys().map(ResourceEntry::new).collect())
    }

    fn read_metadata(&self, entry: &ResourceEntry) -> Result<TypeMetadata, BoxError> {
        match self.read().get(entry.location()) {
            Some(IndexedType::Readable { metadata, .. }) => Ok(metadata.clone()),
            Some(IndexedType::Unreadable { reason }) => Err(reason.clone().into()),
            None => Err(format!("no indexed type at '{}'", entry).into()),
        }
    }

    fn load(&self, metadata: &TypeMetadata) -> Result<TypeRef, BoxError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let loader = match self
            .read()
            .get(ResourceEntry::for_type(&metadata.name).location())
        {
            Some(IndexedType::Readable { loader, .. }) => loader.clone(),
            Some(IndexedType::Unreadable { reason }) => return Err(reason.clone().into()),
            None => return Err(format!("type '{}' is not indexed", metadata.name).into()),
        };
        // The lock is released before running a custom loader.
        match loader {
            Some(loader) => loader(metadata),
            None => Ok(TypeRef::new(metadata.clone())),
        }
    }
}

/// Process-wide type index
pub static GLOBAL_TYPE_INDEX: Lazy<Arc<StaticTypeIndex>> =
    Lazy::new(|| Arc::new(StaticTypeIndex::new()));

/// Register a type in the process-wide index
pub fn register_type(metadata: TypeMetadata) {
    GLOBAL_TYPE_INDEX.register(metadata);
}

/// The process-wide index as a trait object
pub fn global_type_index() -> Arc<dyn TypeIndex> {
    GLOBAL_TYPE_INDEX.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_and_load() {
        let index = StaticTypeIndex::new();
        index.register(TypeMetadata::class("a.b.User"));

        let entries = index.entries().unwrap();
        assert_eq!(entries, vec![ResourceEntry::new("a/b/User")]);

        let meta = index.read_metadata(&entries[0]).unwrap();
        assert_eq!(meta.name, "a.b.User");
        assert_eq!(index.load_count(), 0);

        let loaded = index.load(&meta).unwrap();
        assert_eq!(loaded.name, "a.b.User");
        assert_eq!(index.load_count(), 1);
    }

    #[test]
    fn test_custom_loader_failure() {
        let index = StaticTypeIndex::new();
        index.register_with_loader(TypeMetadata::class("a.Broken"), |_| {
            Err("static initializer failed".into())
        });

        let meta = TypeMetadata::class("a.Broken");
        let err = index.load(&meta).unwrap_err();
        assert_eq!(err.to_string(), "static initializer failed");
    }

    #[test]
    fn test_unreadable_entry() {
        let index = StaticTypeIndex::new();
        index.register_unreadable("a.Corrupt", "bad constant pool");
        let err = index
            .read_metadata(&ResourceEntry::for_type("a.Corrupt"))
            .unwrap_err();
        assert_eq!(err.to_string(), "bad constant pool");
        assert!(index.is_registered("a.Corrupt"));
    }
}
