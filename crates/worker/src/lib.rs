//! Share-request worker.
//!
//! Consumes `ShareRequested` events from the bus and runs the grade
//! ingestion pipeline for each, off the request path of whoever published
//! the event.

pub mod config;
pub mod consumer;

pub use config::{ConsumerSettings, WorkerConfig};
pub use consumer::{HandleError, ShareGradeConsumer};
