//! Domain vocabulary for the lockframe interlocking core: identifiers,
//! signal aspects, entity snapshots, and validation outcomes.
//!
//! This crate holds typed data only. All safety rules live in
//! `lockframe-core`; nothing here reads or writes field state.

pub mod aspect;
pub mod id;
pub mod point;
pub mod signal;
pub mod track;
pub mod validation;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No stores, branches, or sinks are re-exported here.
///

pub mod prelude {
    pub use crate::{
        aspect::{Aspect, AspectGroup},
        id::{EntityId, OperatorId, PointMachineId, SignalId, TrackId},
        point::{OperatingStatus, PointMachine, PointPosition, TrackConnections},
        signal::{Signal, SignalKind},
        track::TrackSection,
        validation::{RuleId, Severity, Status, ValidationResult},
    };
}
