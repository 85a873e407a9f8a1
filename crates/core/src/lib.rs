//! Domain types shared by every gradeshare crate.
//!
//! - [`grade`]: raw crawl entries, course identity keys and the grade rows
//!   written by the ingestion pipeline.
//! - [`consent`]: the two-state share agreement machine.
//! - [`error`]: [`CoreError`](error::CoreError), the domain-level error.

pub mod consent;
pub mod error;
pub mod grade;
pub mod types;
