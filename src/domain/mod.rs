//! Domain types: registered captcha types, their topologies, alphabets and
//! the catalog tying them to configuration.

pub mod alphabet;
pub mod catalog;
pub mod model_type;
pub mod topology;

pub use alphabet::Alphabet;
pub use catalog::{CatalogEntry, LengthViolation, ModelCatalog};
pub use model_type::ModelType;
pub use topology::{Backbone, Head, NetworkTopology};
