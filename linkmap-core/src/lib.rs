pub mod aggregate;
pub mod assemble;
pub mod cards;
pub mod data;
pub mod error;
pub mod model;
pub mod report;
pub mod search;
pub mod source;
pub mod style;

pub use aggregate::AggregationStore;
pub use assemble::GraphAssembler;
pub use cards::GraphPersistence;
pub use data::Database;
pub use error::{ErrorKind, GraphError, Result};
pub use search::SearchIndex;
pub use source::LinkSource;
pub use style::RoleStyles;
