use lockframe_types::prelude::*;
use std::fmt;

///
/// ProtectionSource
///
/// Where a protected-track set was read from. The three sources are
/// deliberately redundant; disagreement between them is a
/// configuration-integrity failure, not a data-quality nuisance.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProtectionSource {
    SignalData,
    InterlockingRules,
    ProtectionTable,
}

impl ProtectionSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SignalData => "signal_data",
            Self::InterlockingRules => "interlocking_rules",
            Self::ProtectionTable => "protection_table",
        }
    }
}

impl fmt::Display for ProtectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// Reconciliation
///
/// Outcome of the cross-check over the redundant protected-track
/// sources. Kept as an explicit tagged result so the inconsistent case
/// can never be collapsed into a single-source read.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Reconciliation {
    /// Non-empty sources agree (or at most one has data). The
    /// authoritative set is the protection table when present, else the
    /// array embedded on the signal; it may be empty.
    Consistent { authoritative: Vec<TrackId> },

    /// Two or more non-empty sources disagree after normalization.
    Inconsistent { sources: Vec<ProtectionSource> },
}

///
/// ProtectedTrackSources
///
/// The three independent reads for one signal, in raw configuration
/// order.
///

#[derive(Clone, Debug, Default)]
pub struct ProtectedTrackSources {
    pub signal_data: Vec<TrackId>,
    pub interlocking_rules: Vec<TrackId>,
    pub protection_table: Vec<TrackId>,
}

impl ProtectedTrackSources {
    /// Cross-check the sources and pick the authoritative set.
    ///
    /// Comparison is by normalized set (sorted, deduplicated); ordering
    /// differences between sources are not a mismatch.
    #[must_use]
    pub fn reconcile(&self) -> Reconciliation {
        let non_empty: Vec<(ProtectionSource, Vec<TrackId>)> = [
            (ProtectionSource::SignalData, &self.signal_data),
            (ProtectionSource::InterlockingRules, &self.interlocking_rules),
            (ProtectionSource::ProtectionTable, &self.protection_table),
        ]
        .into_iter()
        .filter(|(_, tracks)| !tracks.is_empty())
        .map(|(source, tracks)| (source, normalize(tracks)))
        .collect();

        if non_empty.len() >= 2 {
            let (_, baseline) = &non_empty[0];
            if non_empty.iter().any(|(_, tracks)| tracks != baseline) {
                return Reconciliation::Inconsistent {
                    sources: non_empty.into_iter().map(|(source, _)| source).collect(),
                };
            }
        }

        // The protection table is the most explicit source; fall back to
        // the array embedded on the signal entity.
        let authoritative = if self.protection_table.is_empty() {
            self.signal_data.clone()
        } else {
            self.protection_table.clone()
        };

        Reconciliation::Consistent { authoritative }
    }
}

fn normalize(tracks: &[TrackId]) -> Vec<TrackId> {
    let mut normalized = tracks.to_vec();
    normalized.sort();
    normalized.dedup();
    normalized
}

///
/// TESTS
///
