//! Durable topic/consumer-group bus and the events carried on it.
//!
//! - [`Publisher`]: stores an event and fans it out to every consumer group
//!   subscribed to its topic.
//! - [`Subscription`]: one consumer group's view of a topic; claims
//!   deliveries with leases and settles them (ack, retry, dead).
//! - [`ShareRequested`]: the "share my grades" request consumed by the
//!   worker.
//!
//! Delivery is at least once: a delivery whose consumer dies mid-flight is
//! handed out again when its lease expires.

pub mod error;
pub mod publisher;
pub mod share;
pub mod subscription;

pub use error::BusError;
pub use publisher::Publisher;
pub use share::{ShareRequested, SHARE_GRADE_TOPIC, UPDATE_SHARED_GRADE_GROUP};
pub use subscription::Subscription;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// An event type that travels on a fixed topic.
pub trait BusEvent: Serialize + DeserializeOwned {
    /// Topic the event is published on.
    const TOPIC: &'static str;

    /// Partitioning key; events with the same key belong together.
    fn key(&self) -> Option<String> {
        None
    }
}
