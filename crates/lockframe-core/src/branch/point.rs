use crate::store::{StateStore, StoreError};
use lockframe_types::prelude::*;
use log::{debug, warn};
use std::sync::Arc;
use time::OffsetDateTime;

///
/// PointMachineBranch
///
/// Validates requested point-machine position changes against operating
/// status, the locking mechanisms (explicit, time, detection), protecting
/// signals, and the track occupancy implicated by the move.
///

pub struct PointMachineBranch {
    store: Arc<dyn StateStore>,
}

impl PointMachineBranch {
    pub(crate) fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    pub fn validate_position_change(
        &self,
        machine_id: &PointMachineId,
        current: PointPosition,
        requested: PointPosition,
        operator: &OperatorId,
    ) -> Result<ValidationResult, StoreError> {
        debug!("validating position change {current} -> {requested} on {machine_id} for {operator}");

        let Some(machine) = self.store.point_machine(machine_id)? else {
            return Ok(ValidationResult::blocked(
                format!("Point machine not found: {machine_id}"),
                RuleId::PointMachineNotFound,
            ));
        };

        if !machine.is_active {
            return Ok(ValidationResult::blocked(
                format!("Point machine is not active: {machine_id}"),
                RuleId::PointMachineInactive,
            ));
        }

        if current == requested {
            return Ok(ValidationResult::allowed(format!(
                "No change required - point machine {machine_id} already in {requested} position"
            )));
        }

        if let Some(blocked) = Self::check_operating_status(&machine) {
            return Ok(blocked);
        }

        if machine.is_locked {
            return Ok(ValidationResult::blocked(
                format!("Point machine {machine_id} is locked"),
                RuleId::PointMachineLocked,
            ));
        }

        if let Some(blocked) = Self::check_time_lock(&machine) {
            return Ok(blocked);
        }

        if let Some(blocked) = self.check_detection_locks(&machine)? {
            return Ok(blocked);
        }

        if let Some(blocked) = self.check_protecting_signals(&machine)? {
            return Ok(blocked);
        }

        if let Some(blocked) = self.check_affected_tracks(&machine, requested)? {
            return Ok(blocked);
        }

        if let Some(blocked) = self.check_conflicting_machines(&machine)? {
            return Ok(blocked);
        }

        // Route conflicts are reserved: route tables are not modeled yet.

        Ok(ValidationResult::allowed(
            "All point machine validations passed",
        ))
    }

    fn check_operating_status(machine: &PointMachine) -> Option<ValidationResult> {
        let (reason, rule_id) = match machine.operating_status {
            OperatingStatus::Connected => return None,
            OperatingStatus::InTransition => (
                format!("Point machine {} is already in transition", machine.id),
                RuleId::PointMachineInTransition,
            ),
            OperatingStatus::Failed => (
                format!("Point machine {} has failed status", machine.id),
                RuleId::PointMachineFailed,
            ),
            OperatingStatus::LockedOut => (
                format!("Point machine {} is locked out", machine.id),
                RuleId::PointMachineLockedOut,
            ),
        };

        Some(ValidationResult::blocked(reason, rule_id))
    }

    fn check_time_lock(machine: &PointMachine) -> Option<ValidationResult> {
        let expiry = machine.time_lock_expiry?;
        if OffsetDateTime::now_utc() >= expiry {
            return None;
        }

        Some(ValidationResult::blocked(
            format!("Point machine {} is time-locked until {expiry}", machine.id),
            RuleId::PointMachineTimeLocked,
        ))
    }

    /// A machine is detection-locked while any of its detection-lock
    /// tracks reports a train present.
    fn check_detection_locks(
        &self,
        machine: &PointMachine,
    ) -> Result<Option<ValidationResult>, StoreError> {
        for track_id in &machine.detection_locks {
            let Some(section) = self.store.track_section(track_id)? else {
                warn!(
                    "detection-lock track {track_id} of point machine {} not found",
                    machine.id
                );
                continue;
            };

            if section.occupied {
                return Ok(Some(
                    ValidationResult::blocked(
                        format!(
                            "Point machine {} is detection-locked by occupied track {track_id}",
                            machine.id
                        ),
                        RuleId::PointMachineDetectionLocked,
                    )
                    .with_affected(track_id.clone()),
                ));
            }
        }

        Ok(None)
    }

    fn check_protecting_signals(
        &self,
        machine: &PointMachine,
    ) -> Result<Option<ValidationResult>, StoreError> {
        let mut offenders: Vec<(SignalId, Aspect)> = Vec::new();
        for signal_id in &machine.protecting_signals {
            let Some(signal) = self.store.signal(signal_id)? else {
                continue;
            };

            if signal.current_aspect != Aspect::Red {
                offenders.push((signal_id.clone(), signal.current_aspect));
            }
        }

        if offenders.is_empty() {
            return Ok(None);
        }

        let names: Vec<String> = offenders
            .iter()
            .map(|(signal_id, aspect)| format!("{signal_id}({aspect})"))
            .collect();

        let mut result = ValidationResult::blocked(
            format!(
                "Cannot operate point machine {}: protecting signals not at RED: {}",
                machine.id,
                names.join(", ")
            ),
            RuleId::ProtectingSignalsNotRed,
        );
        for (signal_id, _) in offenders {
            result = result.with_affected(signal_id);
        }

        Ok(Some(result))
    }

    /// The root track and the branch selected by the requested position
    /// must both be unoccupied before the blades may move.
    fn check_affected_tracks(
        &self,
        machine: &PointMachine,
        requested: PointPosition,
    ) -> Result<Option<ValidationResult>, StoreError> {
        for track_id in machine.affected_tracks(requested) {
            let Some(section) = self.store.track_section(track_id)? else {
                continue;
            };

            if section.occupied {
                return Ok(Some(
                    ValidationResult::blocked(
                        format!(
                            "Cannot operate point machine {}: affected track {track_id} is occupied by {}",
                            machine.id,
                            section.occupier()
                        ),
                        RuleId::AffectedTrackOccupied,
                    )
                    .with_affected(track_id.clone()),
                ));
            }
        }

        Ok(None)
    }

    fn check_conflicting_machines(
        &self,
        machine: &PointMachine,
    ) -> Result<Option<ValidationResult>, StoreError> {
        for conflicting_id in &machine.conflicting_machines {
            let Some(conflicting) = self.store.point_machine(conflicting_id)? else {
                continue;
            };

            if conflicting.position != PointPosition::Normal {
                return Ok(Some(
                    ValidationResult::blocked(
                        format!(
                            "Cannot operate point machine {}: conflicts with {conflicting_id} in {} position",
                            machine.id, conflicting.position
                        ),
                        RuleId::ConflictingPointMachine,
                    )
                    .with_affected(conflicting_id.clone()),
                ));
            }
        }

        Ok(None)
    }
}

///
/// TESTS
///
