use lockframe_types::prelude::*;

///
/// InterlockingEvent
///
/// Typed safety messages delivered through the injected sink.
/// `SystemFreezeRequired` is the hard-failure escalation path: the
/// consumer must halt/flag the operator console, not merely log it.
///

#[derive(Clone, Debug)]
pub enum InterlockingEvent {
    /// A validated operation was refused; the reason is operator-facing.
    OperationBlocked { entity: EntityId, reason: String },

    /// Reactive enforcement forced protecting signals to the safe aspect.
    AutomaticProtectionActivated { entity: EntityId, reason: String },

    /// The service became operational or dropped offline.
    OperationalStateChanged { operational: bool },

    /// A safety rule was violated in a way that requires attention beyond
    /// the blocked operation itself.
    CriticalSafetyViolation { entity: EntityId, detail: String },

    /// An enforcement write could not be confirmed; manual intervention
    /// is required before operation may resume.
    SystemFreezeRequired {
        entity: EntityId,
        reason: String,
        detail: String,
    },
}
