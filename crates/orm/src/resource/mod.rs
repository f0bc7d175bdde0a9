//! Opaque byte-stream resources and resource pattern resolution.

pub mod locations;
pub mod pattern;

pub use locations::*;
pub use pattern::*;

use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An opaque, lazily opened byte stream with a human-readable identity
pub trait Resource: fmt::Debug + Send + Sync {
    /// Open a fresh stream over the resource contents
    fn open(&self) -> io::Result<Box<dyn Read + Send>>;

    /// Identity used in log and error messages
    fn description(&self) -> String;
}

/// Shared handle to a resource
pub type ResourceRef = Arc<dyn Resource>;

/// A file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResource {
    path: PathBuf,
}

impl FileResource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_ref(self) -> ResourceRef {
        Arc::new(self)
    }
}

impl Resource for FileResource {
    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(std::fs::File::open(&self.path)?))
    }

    fn description(&self) -> String {
        format!("file [{}]", self.path.display())
    }
}

/// In-memory resource with a name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytesResource {
    name: String,
    bytes: Arc<[u8]>,
}

impl BytesResource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn into_ref(self) -> ResourceRef {
        Arc::new(self)
    }
}

impl Resource for BytesResource {
    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(io::Cursor::new(Arc::clone(&self.bytes))))
    }

    fn description(&self) -> String {
        format!("bytes [{}]", self.name)
    }
}
