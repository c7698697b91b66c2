//! Lifecycle events, queued and delivered best-effort, and the live status
//! feed.

pub mod event;
pub mod mqtt;
pub mod publisher;
pub mod queue;
pub mod status_feed;

pub use event::{EventRecord, Snapshot};
pub use mqtt::{MqttSettings, MqttStatusLink};
pub use publisher::{Delivery, EventPublisher, PublishContext, PublisherSettings};
pub use queue::EventQueue;
pub use status_feed::{LinkState, StatusFeed, StatusLink};
