//! Session factory assembly: source resolution, registration, mapper
//! loading, factory construction and finalization.

pub mod assembler;
pub mod factory;
pub mod finalize;
pub mod mappers;
pub mod parser;
pub mod registration;
pub mod source;

pub use assembler::*;
pub use factory::*;
pub use finalize::*;
pub use mappers::*;
pub use parser::DescriptorParser;
pub use registration::*;
pub use source::*;
