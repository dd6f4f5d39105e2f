use lockframe_types::prelude::*;
use thiserror::Error as ThisError;

///
/// StoreError
///
/// Infrastructure failure in the persistence collaborator. Expected rule
/// outcomes are never expressed here; any `StoreError` reaching the
/// service flips it non-operational until re-initialized.
///

#[remain::sorted]
#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("storage backend failure: {message}")]
    Backend { message: String },

    #[error("persistence layer is not connected")]
    Disconnected,
}

///
/// StateStore
///
/// The persistence abstraction the interlocking core validates against,
/// injected at construction. Every method is a direct read of current
/// committed state; how that read reaches physical storage (direct
/// query, replica, cache invalidation) is the collaborator's concern.
///

pub trait StateStore: Send + Sync {
    /// Snapshot of one signal, or `None` for an unknown id.
    fn signal(&self, id: &SignalId) -> Result<Option<Signal>, StoreError>;

    /// Snapshot of one point machine, or `None` for an unknown id.
    fn point_machine(&self, id: &PointMachineId) -> Result<Option<PointMachine>, StoreError>;

    /// Snapshot of one track circuit/section, or `None` for an unknown id.
    fn track_section(&self, id: &TrackId) -> Result<Option<TrackSection>, StoreError>;

    /// Rows of the explicit signal-to-track protection table keyed by
    /// signal: tracks that must be clear before `signal_id` may clear.
    fn protected_tracks(&self, signal_id: &SignalId) -> Result<Vec<TrackId>, StoreError>;

    /// Tracks the interlocking-rule table requires clear for `signal_id`
    /// (source=signal, target=track, constraint MUST_BE_CLEAR/PROTECTING).
    fn rule_protected_tracks(&self, signal_id: &SignalId) -> Result<Vec<TrackId>, StoreError>;

    /// Rows of the protection table keyed by track: signals protecting
    /// `track_id`.
    fn protecting_signals(&self, track_id: &TrackId) -> Result<Vec<SignalId>, StoreError>;

    /// Write a new aspect on behalf of `actor`. Returns whether the write
    /// was acknowledged; the enforcement path re-reads the signal rather
    /// than trusting this flag.
    fn update_signal_aspect(
        &self,
        id: &SignalId,
        aspect: Aspect,
        actor: &OperatorId,
    ) -> Result<bool, StoreError>;

    /// Connectivity probe used by service initialization.
    fn is_connected(&self) -> bool;
}
