use crate::id::{PointMachineId, SignalId, TrackId};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

///
/// PointPosition
///
/// A point machine physically connects its root track to either the
/// normal or the reverse branch.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PointPosition {
    Normal,
    Reverse,
}

impl PointPosition {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Reverse => "REVERSE",
        }
    }
}

impl fmt::Display for PointPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// OperatingStatus
///
/// Position may change only while the machine reports `Connected`.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatingStatus {
    Connected,
    InTransition,
    Failed,
    LockedOut,
}

///
/// TrackConnections
///
/// Track circuits wired to the machine: the shared root, and the branch
/// selected by each position.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TrackConnections {
    pub root: TrackId,
    pub normal: TrackId,
    pub reverse: TrackId,
}

///
/// PointMachine
///
/// Point-in-time snapshot of one point machine as read from the
/// persistence layer.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PointMachine {
    pub id: PointMachineId,
    pub position: PointPosition,
    pub operating_status: OperatingStatus,
    pub is_active: bool,
    pub is_locked: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub time_lock_expiry: Option<OffsetDateTime>,
    pub detection_locks: Vec<TrackId>,
    pub protecting_signals: Vec<SignalId>,
    pub conflicting_machines: Vec<PointMachineId>,
    pub connections: TrackConnections,
}

impl PointMachine {
    /// Tracks implicated by moving to `position`: the root plus the
    /// branch that position selects.
    #[must_use]
    pub const fn affected_tracks(&self, position: PointPosition) -> [&TrackId; 2] {
        let branch = match position {
            PointPosition::Normal => &self.connections.normal,
            PointPosition::Reverse => &self.connections.reverse,
        };

        [&self.connections.root, branch]
    }
}

///
/// TESTS
///
