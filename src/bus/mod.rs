//! Event log - durable, offset-addressed message transport.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  publish   ┌──────────────────────────┐  poll/ack/nack  ┌──────────────┐
//! │ EventProducer│ ─────────▶ │ topic "book-added"        │ ─────────────▶ │ Dispatcher   │
//! └──────────────┘            │ offsets 0..n, per-group   │                └──────────────┘
//!                             │ committed offset          │
//!                             └──────────────────────────┘
//! ```
//!
//! `Publisher` and `Subscriber` are the seams; `InMemoryLog` implements both
//! for tests and single-process deployments. A Kafka or Redis Streams client
//! would slot in behind the same traits.

mod in_memory_log;
mod publisher;
mod subscriber;

pub use in_memory_log::{InMemoryConsumer, InMemoryLog};
pub use publisher::{BusError, Message, Publisher};
pub use subscriber::{Delivery, Subscriber};
