//! Event sink boundary.
//!
//! Branch and service logic MUST NOT depend on any console or widget
//! runtime. All safety notifications flow through `InterlockingEvent`
//! and `EventSink`, injected at service construction.

use crate::obs::event::InterlockingEvent;

///
/// EventSink
///

pub trait EventSink: Send + Sync {
    fn publish(&self, event: InterlockingEvent);
}

///
/// NullEventSink
///
/// Sink that discards everything. Suitable only for tooling that
/// inspects validation results directly; a deployed panel must wire a
/// real sink or freeze escalations are lost.
///

pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn publish(&self, _event: InterlockingEvent) {}
}
