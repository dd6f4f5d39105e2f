use crate::obs::{EventSink, InterlockingEvent};
use lockframe_types::prelude::*;
use std::sync::{Mutex, PoisonError};

///
/// RecordingSink
///
/// `EventSink` double that retains every published event for assertion.
///

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<InterlockingEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<InterlockingEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn operational_changes(&self) -> Vec<bool> {
        self.events()
            .iter()
            .filter_map(|event| match event {
                InterlockingEvent::OperationalStateChanged { operational } => Some(*operational),
                _ => None,
            })
            .collect()
    }

    pub fn contains_operation_blocked(&self, entity: &EntityId) -> bool {
        self.events().iter().any(|event| {
            matches!(event, InterlockingEvent::OperationBlocked { entity: e, .. } if e == entity)
        })
    }

    pub fn contains_automatic_protection(&self, entity: &EntityId) -> bool {
        self.events().iter().any(|event| {
            matches!(
                event,
                InterlockingEvent::AutomaticProtectionActivated { entity: e, .. } if e == entity
            )
        })
    }

    pub fn contains_system_freeze(&self, entity: &EntityId) -> bool {
        self.events().iter().any(|event| {
            matches!(
                event,
                InterlockingEvent::SystemFreezeRequired { entity: e, .. } if e == entity
            )
        })
    }

    pub fn contains_critical_violation(&self, entity: &EntityId) -> bool {
        self.events().iter().any(|event| {
            matches!(
                event,
                InterlockingEvent::CriticalSafetyViolation { entity: e, .. } if e == entity
            )
        })
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event: InterlockingEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
