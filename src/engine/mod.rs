//! Core engine: the scan → budget → analyse run.

pub mod events;
pub mod pipeline;
pub mod scanner;

pub use events::{EventSink, PipelineEvent, RecordingSink, TracingSink};
pub use pipeline::{CompSearch, Pipeline, PipelineSettings};
pub use scanner::{ListingBatch, ListingScanner, ListingSearch};
