//! # mapforge-orm: session factory assembly
//!
//! Builds a single immutable [`SessionFactory`] from an explicit
//! configuration or a descriptor resource, explicit and package-scanned
//! registrations, a database-id lookup and an ordered mapper list.
//!
//! The assembly order is fixed: anything the caller sets before the
//! descriptor is parsed can be seen by the descriptor, the default language
//! driver is applied after it, and the database id is known before any
//! descriptor or mapper content is parsed.

pub mod bootstrap;
pub mod error;
pub mod resource;
pub mod scanning;
pub mod session;

pub use bootstrap::*;
pub use error::*;
pub use resource::*;
pub use scanning::*;
pub use session::*;
