//! Grade sharing service: consent operations and the ingestion pipeline.

pub mod error;
pub mod ingest;
pub mod service;

pub use error::ServiceError;
pub use service::{GradeService, ShareSummary};
