use crate::{
    aspect::Aspect,
    id::{SignalId, TrackId},
};
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// SignalKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalKind {
    Outer,
    Home,
    Starter,
    AdvancedStarter,
}

impl SignalKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Outer => "OUTER",
            Self::Home => "HOME",
            Self::Starter => "STARTER",
            Self::AdvancedStarter => "ADVANCED_STARTER",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// Signal
///
/// Point-in-time snapshot of one signal as read from the persistence
/// layer. Snapshots are never cached across validation calls: a stale
/// read is a safety hazard.
///
/// `protected_tracks` is the embedded redundant copy of the protection
/// configuration; the explicit protection table is read separately and
/// the two are reconciled at validation time.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: SignalId,
    pub kind: SignalKind,
    pub current_aspect: Aspect,
    pub possible_aspects: Vec<Aspect>,
    pub is_active: bool,
    pub protected_tracks: Vec<TrackId>,
    pub interlocked_with: Vec<SignalId>,
}

impl Signal {
    /// Whether the signal head can physically show `aspect`.
    #[must_use]
    pub fn supports(&self, aspect: Aspect) -> bool {
        self.possible_aspects.contains(&aspect)
    }
}

///
/// TESTS
///
