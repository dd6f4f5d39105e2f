//! Validation branches: one per field-element kind.
//!
//! Branches return `ValidationResult` values for expected rule outcomes
//! and reserve `Err` for infrastructure failures, which the service
//! escalates. The track branch additionally owns the reactive
//! enforcement path, the only code allowed to write signal state.

pub(crate) mod point;
pub(crate) mod protection;
pub(crate) mod signal;
pub(crate) mod track;

pub use point::PointMachineBranch;
pub use protection::{ProtectedTrackSources, ProtectionSource, Reconciliation};
pub use signal::SignalBranch;
pub use track::{EnforcementFailure, EnforcementOutcome, TrackCircuitBranch};
