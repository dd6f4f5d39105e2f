use crate::id::{SignalId, TrackId};
use serde::{Deserialize, Serialize};

///
/// TrackSection
///
/// Point-in-time snapshot of one track circuit/section as read from the
/// persistence layer. Occupancy is hardware-detected; assignment is an
/// operator decision and only legal while the section is unoccupied.
///
/// `protecting_signals` is the embedded redundant copy; the explicit
/// protection table is read separately and both sources are consulted
/// during reactive enforcement.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TrackSection {
    pub id: TrackId,
    pub occupied: bool,
    pub occupied_by: Option<String>,
    pub assigned: bool,
    pub is_active: bool,
    pub protecting_signals: Vec<SignalId>,
    pub approach_locked_by: Option<SignalId>,
    pub conflicting_tracks: Vec<TrackId>,
    pub adjacent_tracks: Vec<TrackId>,
}

impl TrackSection {
    /// Occupier label for operator-facing messages.
    #[must_use]
    pub fn occupier(&self) -> &str {
        self.occupied_by.as_deref().unwrap_or("unknown")
    }
}

///
/// TESTS
///
