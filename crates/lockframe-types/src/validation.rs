use crate::id::EntityId;
use serde::Serialize;
use std::fmt;
use time::OffsetDateTime;

///
/// Status
///
/// Outcome class of one validation. `Conditional` and `ManualOverride`
/// are part of the closed vocabulary for panel integration; the core
/// currently constructs only `Allowed` and `Blocked`.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Allowed,
    Blocked,
    Conditional,
    ManualOverride,
}

///
/// Severity
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
    Emergency,
}

///
/// RuleId
///
/// Stable identifier of the rule that decided a validation. Displays as
/// the canonical wire name surfaced to operators and audit logs.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum RuleId {
    ActiveRouteMember,
    AffectedTrackOccupied,
    ApproachLockActive,
    ApproachLocked,
    AspectNotSupported,
    ConflictingPointMachine,
    ConflictingTrackAssigned,
    ControllingSignalRestriction,
    InterlockedSignalConflict,
    InvalidTransition,
    PointMachineDetectionLocked,
    PointMachineFailed,
    PointMachineInTransition,
    PointMachineInactive,
    PointMachineLocked,
    PointMachineLockedOut,
    PointMachineNotFound,
    PointMachineTimeLocked,
    ProtectingSignalsNotRed,
    ProtectingSignalsNotSafe,
    RouteConflict,
    SignalInactive,
    SignalNotFound,
    SignalNotInRules,
    SystemOffline,
    TrackInactive,
    TrackNotFound,
    TrackOccupied,
    TrackProtectionValidationFailed,
    TrackStillOccupied,
}

impl RuleId {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ActiveRouteMember => "ACTIVE_ROUTE_MEMBER",
            Self::AffectedTrackOccupied => "AFFECTED_TRACK_OCCUPIED",
            Self::ApproachLockActive => "APPROACH_LOCK_ACTIVE",
            Self::ApproachLocked => "APPROACH_LOCKED",
            Self::AspectNotSupported => "ASPECT_NOT_SUPPORTED",
            Self::ConflictingPointMachine => "CONFLICTING_POINT_MACHINE",
            Self::ConflictingTrackAssigned => "CONFLICTING_TRACK_ASSIGNED",
            Self::ControllingSignalRestriction => "CONTROLLING_SIGNAL_RESTRICTION",
            Self::InterlockedSignalConflict => "INTERLOCKED_SIGNAL_CONFLICT",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::PointMachineDetectionLocked => "POINT_MACHINE_DETECTION_LOCKED",
            Self::PointMachineFailed => "POINT_MACHINE_FAILED",
            Self::PointMachineInTransition => "POINT_MACHINE_IN_TRANSITION",
            Self::PointMachineInactive => "POINT_MACHINE_INACTIVE",
            Self::PointMachineLocked => "POINT_MACHINE_LOCKED",
            Self::PointMachineLockedOut => "POINT_MACHINE_LOCKED_OUT",
            Self::PointMachineNotFound => "POINT_MACHINE_NOT_FOUND",
            Self::PointMachineTimeLocked => "POINT_MACHINE_TIME_LOCKED",
            Self::ProtectingSignalsNotRed => "PROTECTING_SIGNALS_NOT_RED",
            Self::ProtectingSignalsNotSafe => "PROTECTING_SIGNALS_NOT_SAFE",
            Self::RouteConflict => "ROUTE_CONFLICT",
            Self::SignalInactive => "SIGNAL_INACTIVE",
            Self::SignalNotFound => "SIGNAL_NOT_FOUND",
            Self::SignalNotInRules => "SIGNAL_NOT_IN_RULES",
            Self::SystemOffline => "SYSTEM_OFFLINE",
            Self::TrackInactive => "TRACK_INACTIVE",
            Self::TrackNotFound => "TRACK_NOT_FOUND",
            Self::TrackOccupied => "TRACK_OCCUPIED",
            Self::TrackProtectionValidationFailed => "TRACK_PROTECTION_VALIDATION_FAILED",
            Self::TrackStillOccupied => "TRACK_STILL_OCCUPIED",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// ValidationResult
///
/// Immutable outcome of one validation. Constructed fresh per call,
/// never mutated after return. Expected rule violations are expressed
/// here, never as errors.
///

#[derive(Clone, Debug, Serialize)]
pub struct ValidationResult {
    status: Status,
    severity: Severity,
    reason: String,
    rule_id: Option<RuleId>,
    affected_entities: Vec<EntityId>,
    #[serde(with = "time::serde::rfc3339")]
    evaluated_at: OffsetDateTime,
}

impl ValidationResult {
    fn new(status: Status, severity: Severity, reason: impl Into<String>) -> Self {
        Self {
            status,
            severity,
            reason: reason.into(),
            rule_id: None,
            affected_entities: Vec::new(),
            evaluated_at: OffsetDateTime::now_utc(),
        }
    }

    #[must_use]
    pub fn allowed(reason: impl Into<String>) -> Self {
        Self::new(Status::Allowed, Severity::Info, reason)
    }

    #[must_use]
    pub fn blocked(reason: impl Into<String>, rule_id: RuleId) -> Self {
        let mut result = Self::new(Status::Blocked, Severity::Critical, reason);
        result.rule_id = Some(rule_id);
        result
    }

    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    #[must_use]
    pub fn with_affected(mut self, entity: impl Into<EntityId>) -> Self {
        self.affected_entities.push(entity.into());
        self
    }

    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.status == Status::Allowed
    }

    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.status == Status::Blocked
    }

    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    #[must_use]
    pub const fn rule_id(&self) -> Option<RuleId> {
        self.rule_id
    }

    #[must_use]
    pub fn affected_entities(&self) -> &[EntityId] {
        &self.affected_entities
    }

    #[must_use]
    pub const fn evaluated_at(&self) -> OffsetDateTime {
        self.evaluated_at
    }
}

///
/// TESTS
///
