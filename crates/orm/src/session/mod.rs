//! Session model: configuration, components and registries.

pub mod components;
pub mod configuration;
pub mod database_id;
pub mod environment;
pub mod registry;
pub mod statement;

pub use components::*;
pub use configuration::*;
pub use database_id::*;
pub use environment::*;
pub use registry::*;
pub use statement::*;
