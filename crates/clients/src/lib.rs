//! Clients for the two external collaborators of the ingestion pipeline.
//!
//! - [`GradeCrawler`]: logs into the campus system with a student's
//!   credentials and returns every grade on record.
//! - [`CourseRegistry`]: maps (code, name, teacher) triples to internal
//!   course ids, creating missing courses as a side effect.
//!
//! Both are `async_trait` seams so the pipeline can be driven by fakes in
//! tests; [`HttpGradeCrawler`] and [`HttpCourseRegistry`] are the `reqwest`
//! implementations used in production.

pub mod crawl;
pub mod error;
pub mod registry;

pub use crawl::{GradeCrawler, HttpGradeCrawler};
pub use error::ClientError;
pub use registry::{CourseRegistry, HttpCourseRegistry};
