//! Bulk upload of the company reference-data graph.

pub mod payload;
pub mod pipeline;
pub mod resolve;
pub mod transform;

pub use payload::ImportPayload;
pub use pipeline::{ConfigImporter, ImportReport, SectionResult};
