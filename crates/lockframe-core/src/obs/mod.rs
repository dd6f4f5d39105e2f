//! Observability: typed safety events and the response-time telemetry.
//!
//! Core validation logic does not talk to any console or widget runtime
//! directly. Everything an operator must see flows through
//! [`InterlockingEvent`] and the injected [`EventSink`].

pub(crate) mod event;
pub(crate) mod perf;
pub(crate) mod sink;

pub use event::InterlockingEvent;
pub use perf::ResponseTimes;
pub use sink::{EventSink, NullEventSink};
