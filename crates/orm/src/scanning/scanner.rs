//! Package scanning over a type index.

use crate::error::{BoxError, ScanError, SessionError, SessionResult};
use crate::resource::{tokenize_patterns, PackagePattern};
use crate::scanning::{global_type_index, ResourceEntry, TypeFilter, TypeIndex, TypeMetadata, TypeRef};
use dashmap::DashMap;
use mapforge_core::targets;
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Types discovered by a scan, plus the candidates that were excluded
#[derive(Debug, Default)]
pub struct ScanResult {
    types: HashSet<TypeRef>,
    excluded: Vec<ScanError>,
}

impl ScanResult {
    pub fn types(&self) -> &HashSet<TypeRef> {
        &self.types
    }

    pub fn into_types(self) -> HashSet<TypeRef> {
        self.types
    }

    pub fn excluded(&self) -> &[ScanError] {
        &self.excluded
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.iter().any(|t| t.name == type_name)
    }
}

/// Reads type metadata through an index, remembering what it has read
#[derive(Debug)]
pub struct CachingMetadataReader {
    index: Arc<dyn TypeIndex>,
    cache: DashMap<ResourceEntry, TypeMetadata>,
}

impl CachingMetadataReader {
    pub fn new(index: Arc<dyn TypeIndex>) -> Self {
        Self {
            index,
            cache: DashMap::new(),
        }
    }

    pub fn read(&self, entry: &ResourceEntry) -> Result<TypeMetadata, BoxError> {
        if let Some(cached) = self.cache.get(entry) {
            return Ok(cached.clone());
        }
        let metadata = self.index.read_metadata(entry)?;
        self.cache.insert(entry.clone(), metadata.clone());
        Ok(metadata)
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}

/// Resolves package patterns into types accepted by a capability filter
#[derive(Debug)]
pub struct ResourceScanner {
    index: Arc<dyn TypeIndex>,
    reader: CachingMetadataReader,
    scan_log: bool,
}

impl ResourceScanner {
    pub fn new(index: Arc<dyn TypeIndex>) -> Self {
        Self {
            reader: CachingMetadataReader::new(Arc::clone(&index)),
            index,
            scan_log: false,
        }
    }

    /// Scanner over the process-wide type index
    pub fn global() -> Self {
        Self::new(global_type_index())
    }

    /// Log every discovered type on the scan log category
    pub fn with_scan_log(mut self, enabled: bool) -> Self {
        self.scan_log = enabled;
        self
    }

    pub fn index(&self) -> &Arc<dyn TypeIndex> {
        &self.index
    }

    pub fn metadata_reader(&self) -> &CachingMetadataReader {
        &self.reader
    }

    /// Scan `patterns` (comma, semicolon or whitespace separated).
    ///
    /// Candidates are filtered on metadata before they are loaded. A candidate
    /// whose metadata cannot be read or whose load fails is logged, recorded in
    /// [`ScanResult::excluded`] and skipped; a loader that panics counts as a
    /// failed load. Only failing to enumerate the index
    /// or an uncompilable pattern is an error.
    pub fn scan(&self, patterns: &str, filter: &TypeFilter) -> SessionResult<ScanResult> {
        let mut result = ScanResult::default();
        let tokens = tokenize_patterns(patterns);
        if tokens.is_empty() {
            return Ok(result);
        }

        let entries = self.index.entries().map_err(|source| SessionError::Scan {
            pattern: patterns.to_string(),
            source,
        })?;

        let mut failed: HashSet<String> = HashSet::new();
        let mut accepted: HashSet<String> = HashSet::new();
        for token in &tokens {
            let pattern = PackagePattern::compile(token).map_err(|e| SessionError::Scan {
                pattern: token.clone(),
                source: Box::new(e),
            })?;

            for entry in entries.iter().filter(|e| pattern.matches_package(&e.package())) {
                if failed.contains(entry.location()) {
                    continue;
                }
                let metadata = match self.reader.read(entry) {
                    Ok(metadata) => metadata,
                    Err(e) => {
                        let error = ScanError::MetadataUnreadable {
                            resource: entry.to_string(),
                            reason: e.to_string(),
                        };
                        tracing::warn!("{}", error);
                        failed.insert(entry.location().to_string());
                        result.excluded.push(error);
                        continue;
                    }
                };

                if !filter.matches(&metadata) {
                    tracing::trace!("{} rejected by filter '{}'", metadata.name, filter.description());
                    continue;
                }
                if accepted.contains(&metadata.name) {
                    continue;
                }

                let loaded = catch_unwind(AssertUnwindSafe(|| self.index.load(&metadata)))
                    .unwrap_or_else(|panic_info| Err(panic_message(panic_info.as_ref()).into()));
                match loaded {
                    Ok(loaded) => {
                        if self.scan_log {
                            tracing::info!(target: targets::SCAN, "Discovered type '{}' via '{}'", loaded, token);
                        }
                        accepted.insert(metadata.name.clone());
                        result.types.insert(loaded);
                    }
                    Err(e) => {
                        let error = ScanError::LoadFailure {
                            type_name: metadata.name.clone(),
                            reason: e.to_string(),
                        };
                        tracing::warn!("{}", error);
                        failed.insert(entry.location().to_string());
                        result.excluded.push(error);
                    }
                }
            }
        }

        tracing::debug!(
            "Scanned '{}': {} types accepted, {} excluded",
            patterns,
            result.types.len(),
            result.excluded.len()
        );
        Ok(result)
    }
}

fn panic_message(panic_info: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<String>() {
        format!("loader panicked: {}", s)
    } else if let Some(s) = panic_info.downcast_ref::<&str>() {
        format!("loader panicked: {}", s)
    } else {
        "loader panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanning::StaticTypeIndex;

    fn index() -> Arc<StaticTypeIndex> {
        let index = StaticTypeIndex::new();
        index.register(TypeMetadata::class("a.b.Direct"));
        index.register(TypeMetadata::class("a.b.x.Child"));
        index.register(TypeMetadata::class("a.b.x.y.Grandchild"));
        index.register(TypeMetadata::class("a.c.Unrelated"));
        index.register(TypeMetadata::class("z.Other"));
        Arc::new(index)
    }

    #[test]
    fn test_empty_patterns_yield_empty_result() {
        let scanner = ResourceScanner::new(index());
        let result = scanner.scan(" ;, ", &TypeFilter::any()).unwrap();
        assert!(result.is_empty());
        assert!(result.excluded().is_empty());
    }

    #[test]
    fn test_wildcard_scans_package_and_subpackages() {
        let scanner = ResourceScanner::new(index());
        let result = scanner.scan("a.b.*", &TypeFilter::any()).unwrap();

        assert_eq!(result.len(), 3);
        assert!(result.contains("a.b.Direct"));
        assert!(result.contains("a.b.x.Child"));
        assert!(result.contains("a.b.x.y.Grandchild"));
        assert!(!result.contains("a.c.Unrelated"));
        assert!(!result.contains("z.Other"));
    }

    #[test]
    fn test_filter_runs_before_load() {
        let index = index();
        let scanner = ResourceScanner::new(index.clone());
        let filter = TypeFilter::new("children only", |m| m.name.ends_with("Child"));

        let result = scanner.scan("a", &filter).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(index.load_count(), 1);
    }

    #[test]
    fn test_metadata_is_cached_between_scans() {
        let scanner = ResourceScanner::new(index());
        scanner.scan("a.b", &TypeFilter::any()).unwrap();
        let cached = scanner.metadata_reader().cached_entries();
        scanner.scan("a.b", &TypeFilter::any()).unwrap();
        assert_eq!(cached, 3);
        assert_eq!(scanner.metadata_reader().cached_entries(), 3);
    }

    #[test]
    fn test_panicking_loader_is_excluded() {
        let index = StaticTypeIndex::new();
        index.register(TypeMetadata::class("p.Healthy"));
        index.register_with_loader(TypeMetadata::class("p.Panicking"), |meta| {
            panic!("static initializer of {} failed", meta.name)
        });
        let scanner = ResourceScanner::new(Arc::new(index));

        let result = scanner.scan("p", &TypeFilter::any()).unwrap();

        assert!(result.contains("p.Healthy"));
        assert!(!result.contains("p.Panicking"));
        assert_eq!(result.excluded().len(), 1);
        match &result.excluded()[0] {
            ScanError::LoadFailure { type_name, reason } => {
                assert_eq!(type_name, "p.Panicking");
                assert!(reason.contains("static initializer of p.Panicking failed"));
            }
            other => panic!("unexpected exclusion: {:?}", other),
        }
    }

    #[test]
    fn test_accepted_type_is_loaded_once_across_patterns() {
        let index = index();
        let scanner = ResourceScanner::new(index.clone());

        let result = scanner.scan("a.b a.b.x a.b.*", &TypeFilter::any()).unwrap();

        assert_eq!(result.len(), 3);
        assert_eq!(index.load_count(), 3);
    }
}
