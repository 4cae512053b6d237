//! # ptms-events
//!
//! Event notification bus for Project-TMS.
//!
//! The task and project stores are the only publishers. Observers (board
//! refresher, CLI watch session, analytics) subscribe and receive owned
//! copies of every event after the mutation is committed, so a subscriber
//! can never re-enter a store while it holds its lock.
//!
//! - **Events**: [`TmsEvent`] with the wire names used by earlier clients
//!   (`task:created`, `timeTracking:started`, ...)
//! - **Envelope**: [`EventEnvelope`] adds a sequence number and timestamp
//! - **Bus**: [`EventBus`] fans envelopes out over a `tokio` broadcast channel

#![deny(unsafe_code)]

pub mod bus;
pub mod envelope;
pub mod event;

pub use bus::EventBus;
pub use envelope::EventEnvelope;
pub use event::TmsEvent;
