use crate::resource::{FileResource, PathPattern, ResourceRef};
use std::path::Path;
use walkdir::WalkDir;

/// Resolve a `/`-separated resource pattern against the files under `root`.
///
/// Results are sorted by relative path so that a resolved mapper list has a
/// stable order. A missing root resolves to an empty list.
pub fn resolve_resources(root: &Path, pattern: &str) -> Result<Vec<ResourceRef>, regex::Error> {
    let pattern = PathPattern::compile(pattern)?;
    if !root.is_dir() {
        tracing::debug!("Resource root '{}' does not exist", root.display());
        return Ok(Vec::new());
    }

    let mut matches: Vec<(String, std::path::PathBuf)> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under '{}': {}", root.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(root).ok()?;
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            pattern
                .matches(&relative)
                .then(|| (relative, entry.path().to_path_buf()))
        })
        .collect();

    matches.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(matches
        .into_iter()
        .map(|(_, path)| FileResource::new(path).into_ref())
        .collect())
}
