//! Wildcard pattern compilation with a process-wide cache.
//!
//! Package patterns (`a.b.*`, `com.*.model`, `org.**.dao`) and resource path
//! patterns (`mappers/**/*-mapper.xml`) compile to anchored regexes. Compiled
//! patterns live for the life of the process, keyed by pattern string; the
//! set of resources a process can see does not change, so nothing is evicted.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Delimiters accepted between patterns in a single pattern string
pub const PATTERN_DELIMITERS: &[char] = &[',', ';', ' ', '\t', '\n', '\r'];

static PATTERN_CACHE: Lazy<RwLock<HashMap<String, Arc<Regex>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Split a delimiter-separated pattern string into trimmed, non-empty tokens
pub fn tokenize_patterns(patterns: &str) -> Vec<String> {
    patterns
        .split(PATTERN_DELIMITERS)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// A compiled package pattern, matched against a type's package name
#[derive(Debug, Clone)]
pub struct PackagePattern {
    source: String,
    regex: Arc<Regex>,
}

impl PackagePattern {
    /// Compile (or fetch from the process cache) a package pattern
    pub fn compile(pattern: &str) -> Result<Self, regex::Error> {
        let regex = cached(&format!("package:{}", pattern), || {
            translate(pattern, '.', true)
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether a type in `package` falls under this pattern
    pub fn matches_package(&self, package: &str) -> bool {
        self.regex.is_match(&format!(".{}", package))
    }
}

/// A compiled `/`-separated resource path pattern
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    regex: Arc<Regex>,
}

impl PathPattern {
    pub fn compile(pattern: &str) -> Result<Self, regex::Error> {
        let regex = cached(&format!("path:{}", pattern), || {
            translate(pattern.trim_start_matches('/'), '/', false)
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match a relative path using `/` separators
    pub fn matches(&self, path: &str) -> bool {
        self.regex
            .is_match(&format!("/{}", path.trim_start_matches('/')))
    }
}

/// Number of distinct compiled patterns held by the process cache
pub fn cached_pattern_count() -> usize {
    PATTERN_CACHE
        .read()
        .map(|cache| cache.len())
        .unwrap_or_else(|poisoned| poisoned.into_inner().len())
}

fn cached(key: &str, build: impl FnOnce() -> String) -> Result<Arc<Regex>, regex::Error> {
    if let Some(regex) = PATTERN_CACHE
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .get(key)
    {
        return Ok(Arc::clone(regex));
    }

    let regex = Arc::new(Regex::new(&build())?);
    let mut cache = PATTERN_CACHE
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    Ok(Arc::clone(cache.entry(key.to_string()).or_insert(regex)))
}

/// Translate a wildcard pattern into an anchored regex over `sep`-prefixed
/// names. `**` spans any number of segments. `*` alone spans exactly one,
/// except as the final segment of a package pattern where it also admits the
/// package itself. Package patterns always cover descendants.
fn translate(pattern: &str, sep: char, package: bool) -> String {
    let sep_re = regex::escape(&sep.to_string());
    let one = format!("{}[^{}]+", sep_re, sep_re);
    let any = format!("(?:{})*", one);

    let segments: Vec<&str> = pattern.split(sep).collect();
    let last = segments.len().saturating_sub(1);

    let mut out = String::from("^");
    for (i, segment) in segments.iter().enumerate() {
        match *segment {
            "**" => out.push_str(&any),
            "*" if package && i == last => out.push_str(&any),
            "*" => out.push_str(&one),
            literal if literal.contains('*') => {
                out.push_str(&sep_re);
                let parts: Vec<String> = literal.split('*').map(regex::escape).collect();
                out.push_str(&parts.join(&format!("[^{}]*", sep_re)));
            }
            literal => {
                out.push_str(&sep_re);
                out.push_str(&regex::escape(literal));
            }
        }
    }
    if package {
        out.push_str(&any);
    }
    out.push('$');
    out
}
