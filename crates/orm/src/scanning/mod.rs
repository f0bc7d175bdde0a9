//! Type discovery: metadata, the type index and the package scanner.

pub mod index;
pub mod metadata;
pub mod scanner;

pub use index::*;
pub use metadata::*;
pub use scanner::*;
