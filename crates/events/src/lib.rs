//! Lifecycle events: the event contract, an append-only log, and pub/sub fan-out.
//!
//! Registries record every committed state change in an [`EventLog`] and then
//! publish it through an [`EventBus`]. Publication is decoupled from the log:
//! a failed delivery never undoes a committed change.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod handler;
pub mod in_memory_bus;
pub mod log;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use handler::execute;
pub use in_memory_bus::{BusError, InMemoryEventBus};
pub use log::EventLog;
