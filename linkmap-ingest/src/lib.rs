pub mod error;
pub mod observation;
pub mod pipeline;

pub use error::IngestError;
pub use observation::LinkObservation;
pub use pipeline::{IngestOutcome, IngestPipeline, IngestSummary};
