pub mod properties;
pub mod settings;
pub mod sources;
pub mod validation;

pub use properties::*;
pub use settings::*;
pub use sources::*;
pub use validation::*;
