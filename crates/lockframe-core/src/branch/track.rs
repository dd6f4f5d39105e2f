use crate::store::{StateStore, StoreError};
use lockframe_types::prelude::*;
use log::{debug, error, warn};
use std::sync::Arc;

/// Actor recorded on bypass writes issued by reactive enforcement.
pub(crate) const ENFORCEMENT_ACTOR: &str = "INTERLOCKING_SYSTEM";

///
/// EnforcementFailure
///
/// One protecting signal that could not be confirmed at RED. Carries the
/// entity id explicitly so failure handling never has to parse it back
/// out of a message.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EnforcementFailure {
    pub signal_id: SignalId,
    pub detail: String,
}

///
/// EnforcementOutcome
///
/// Result of one reactive enforcement pass. Enforcement runs to
/// completion across all protecting signals, accumulating failures
/// rather than aborting; partial enforcement is worse than
/// full-attempted enforcement.
///

#[derive(Clone, Debug, Default)]
pub struct EnforcementOutcome {
    /// Signals forced to RED and confirmed by re-read.
    pub forced: Vec<SignalId>,

    /// Signals already at RED; left unwritten.
    pub already_safe: Vec<SignalId>,

    /// Signals whose forced write could not be confirmed.
    pub failures: Vec<EnforcementFailure>,

    /// The occupied track had no protecting signals in either source,
    /// a configuration gap this routine cannot fix.
    pub unprotected: bool,
}

impl EnforcementOutcome {
    /// Whether every protecting signal is confirmed at RED.
    #[must_use]
    pub fn is_fully_enforced(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of protecting signals covered by this pass.
    #[must_use]
    pub fn signals_covered(&self) -> usize {
        self.forced.len() + self.already_safe.len()
    }
}

///
/// TrackCircuitBranch
///
/// Two responsibilities: validating operator-requested track assignment
/// changes, and reactive enforcement: forcing protecting signals to RED
/// when a track circuit becomes occupied. Enforcement is the only code
/// path that writes signal state, and it is never reachable from
/// operator input.
///

pub struct TrackCircuitBranch {
    store: Arc<dyn StateStore>,
}

impl TrackCircuitBranch {
    pub(crate) fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    // -------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------

    pub fn validate_track_assignment(
        &self,
        track_id: &TrackId,
        currently_assigned: bool,
        requested_assignment: bool,
        operator: &OperatorId,
    ) -> Result<ValidationResult, StoreError> {
        debug!(
            "validating track assignment {currently_assigned} -> {requested_assignment} on {track_id} for {operator}"
        );

        let Some(section) = self.store.track_section(track_id)? else {
            return Ok(ValidationResult::blocked(
                format!("Track section not found: {track_id}"),
                RuleId::TrackNotFound,
            ));
        };

        if !section.is_active {
            return Ok(ValidationResult::blocked(
                format!("Track section is not active: {track_id}"),
                RuleId::TrackInactive,
            ));
        }

        if currently_assigned == requested_assignment {
            return Ok(ValidationResult::allowed(format!(
                "No change required - track {track_id} already in requested state"
            )));
        }

        if let Some(blocked) = Self::check_occupancy(&section, requested_assignment) {
            return Ok(blocked);
        }

        if let Some(blocked) = self.check_signal_protection(&section, requested_assignment)? {
            return Ok(blocked);
        }

        if let Some(blocked) = self.check_approach_locking(&section, requested_assignment)? {
            return Ok(blocked);
        }

        if let Some(blocked) = Self::check_route_integrity(&section, requested_assignment) {
            return Ok(blocked);
        }

        if let Some(blocked) = self.check_track_conflicts(&section, requested_assignment)? {
            return Ok(blocked);
        }

        // Maintenance mode is reserved; no section reports it yet.

        Ok(ValidationResult::allowed(
            "All track assignment validations passed",
        ))
    }

    fn check_occupancy(section: &TrackSection, requested_assignment: bool) -> Option<ValidationResult> {
        if !section.occupied {
            return None;
        }

        let result = if requested_assignment {
            ValidationResult::blocked(
                format!(
                    "Cannot assign track {}: occupied by {}",
                    section.id,
                    section.occupier()
                ),
                RuleId::TrackOccupied,
            )
        } else {
            ValidationResult::blocked(
                format!(
                    "Cannot unassign track {}: still occupied by {}",
                    section.id,
                    section.occupier()
                ),
                RuleId::TrackStillOccupied,
            )
        };

        Some(result)
    }

    /// Assigning a track requires its protecting signals at the safe
    /// aspect.
    fn check_signal_protection(
        &self,
        section: &TrackSection,
        requested_assignment: bool,
    ) -> Result<Option<ValidationResult>, StoreError> {
        if !requested_assignment {
            return Ok(None);
        }

        let protecting = self.store.protecting_signals(&section.id)?;
        if protecting.is_empty() || self.all_signals_at_red(&protecting)? {
            return Ok(None);
        }

        Ok(Some(ValidationResult::blocked(
            format!(
                "Cannot assign track {}: protecting signals not at safe aspects",
                section.id
            ),
            RuleId::ProtectingSignalsNotSafe,
        )))
    }

    /// An approach-locked track cannot be assigned, and can only be
    /// unassigned once the locking signal has returned to RED.
    fn check_approach_locking(
        &self,
        section: &TrackSection,
        requested_assignment: bool,
    ) -> Result<Option<ValidationResult>, StoreError> {
        let Some(locking_signal) = &section.approach_locked_by else {
            return Ok(None);
        };

        if requested_assignment {
            return Ok(Some(
                ValidationResult::blocked(
                    format!(
                        "Cannot assign track {}: approach locked by signal {locking_signal}",
                        section.id
                    ),
                    RuleId::ApproachLocked,
                )
                .with_affected(locking_signal.clone()),
            ));
        }

        if let Some(signal) = self.store.signal(locking_signal)? {
            if signal.current_aspect != Aspect::Red {
                return Ok(Some(
                    ValidationResult::blocked(
                        format!(
                            "Cannot unassign track {}: approach lock active from signal {locking_signal} showing {}",
                            section.id, signal.current_aspect
                        ),
                        RuleId::ApproachLockActive,
                    )
                    .with_affected(locking_signal.clone()),
                ));
            }
        }

        Ok(None)
    }

    fn check_route_integrity(
        section: &TrackSection,
        requested_assignment: bool,
    ) -> Option<ValidationResult> {
        if !requested_assignment && Self::is_part_of_active_route(&section.id) {
            return Some(ValidationResult::blocked(
                format!("Cannot unassign track {}: part of active route", section.id),
                RuleId::ActiveRouteMember,
            ));
        }

        None
    }

    /// Route tables are not modeled yet; no track can be a route member.
    const fn is_part_of_active_route(_track_id: &TrackId) -> bool {
        false
    }

    fn check_track_conflicts(
        &self,
        section: &TrackSection,
        requested_assignment: bool,
    ) -> Result<Option<ValidationResult>, StoreError> {
        if !requested_assignment {
            return Ok(None);
        }

        for adjacent_id in &section.adjacent_tracks {
            if let Some(adjacent) = self.store.track_section(adjacent_id)? {
                if adjacent.assigned {
                    warn!(
                        "adjacent track {adjacent_id} is also assigned while assigning {}",
                        section.id
                    );
                }
            }
        }

        for conflicting_id in &section.conflicting_tracks {
            let Some(conflicting) = self.store.track_section(conflicting_id)? else {
                continue;
            };

            if conflicting.assigned {
                return Ok(Some(
                    ValidationResult::blocked(
                        format!(
                            "Cannot assign track {}: conflicts with assigned track {conflicting_id}",
                            section.id
                        ),
                        RuleId::ConflictingTrackAssigned,
                    )
                    .with_affected(conflicting_id.clone()),
                ));
            }
        }

        Ok(None)
    }

    fn all_signals_at_red(&self, signal_ids: &[SignalId]) -> Result<bool, StoreError> {
        for signal_id in signal_ids {
            if let Some(signal) = self.store.signal(signal_id)? {
                if signal.current_aspect != Aspect::Red {
                    warn!(
                        "protecting signal {signal_id} shows {} (not RED)",
                        signal.current_aspect
                    );
                    return Ok(false);
                }
            }
        }

        Ok(true)
    }

    // -------------------------------------------------------------------
    // Reactive enforcement
    // -------------------------------------------------------------------

    /// Force every signal protecting `track_id` to RED after the section
    /// became occupied. Fires only on the `false -> true` transition; a
    /// track that stays occupied or becomes clear is not a fresh hazard.
    ///
    /// `Err` is returned only for failures before the write loop starts;
    /// once writing begins, per-signal failures accumulate in the
    /// outcome.
    pub fn enforce_occupancy_interlocking(
        &self,
        track_id: &TrackId,
        was_occupied: bool,
        is_occupied: bool,
    ) -> Result<EnforcementOutcome, StoreError> {
        let mut outcome = EnforcementOutcome::default();

        if was_occupied || !is_occupied {
            debug!("occupancy transition on {track_id} needs no enforcement");
            return Ok(outcome);
        }

        let Some(section) = self.store.track_section(track_id)? else {
            error!("SAFETY: occupancy reported for unknown track section {track_id}");
            outcome.unprotected = true;
            return Ok(outcome);
        };

        if !section.is_active {
            warn!("SAFETY: occupancy reported for inactive track section {track_id}");
            outcome.unprotected = true;
            return Ok(outcome);
        }

        // Union of both redundant sources, deduplicated, stable order.
        let mut protecting = self.store.protecting_signals(track_id)?;
        for signal_id in &section.protecting_signals {
            if !protecting.contains(signal_id) {
                protecting.push(signal_id.clone());
            }
        }

        if protecting.is_empty() {
            warn!("SAFETY: occupied track {track_id} has no protecting signals configured");
            outcome.unprotected = true;
            return Ok(outcome);
        }

        for signal_id in protecting {
            match self.force_signal_to_red(&signal_id) {
                Ok(ForceResult::AlreadySafe) => outcome.already_safe.push(signal_id),
                Ok(ForceResult::Forced) => outcome.forced.push(signal_id),
                Err(detail) => {
                    error!("SAFETY: could not confirm {signal_id} at RED: {detail}");
                    outcome.failures.push(EnforcementFailure { signal_id, detail });
                }
            }
        }

        Ok(outcome)
    }

    /// Read-then-conditionally-write: a signal already at RED is left
    /// unwritten. The write bypasses the validation pipeline: the
    /// transition to RED is always legal, and the pipeline would itself
    /// require this track to be protected.
    fn force_signal_to_red(&self, signal_id: &SignalId) -> Result<ForceResult, String> {
        let signal = self
            .store
            .signal(signal_id)
            .map_err(|err| format!("read before write failed: {err}"))?
            .ok_or_else(|| "protecting signal not found".to_string())?;

        if signal.current_aspect == Aspect::Red {
            return Ok(ForceResult::AlreadySafe);
        }

        let actor = OperatorId::new(ENFORCEMENT_ACTOR);
        let acknowledged = self
            .store
            .update_signal_aspect(signal_id, Aspect::Red, &actor)
            .map_err(|err| format!("forced RED write failed: {err}"))?;

        if !acknowledged {
            warn!("forced RED write on {signal_id} was not acknowledged; verifying by re-read");
        }

        // Confirm by re-read; the write's return code is not trusted.
        match self.store.signal(signal_id) {
            Ok(Some(signal)) if signal.current_aspect == Aspect::Red => Ok(ForceResult::Forced),
            Ok(Some(signal)) => Err(format!(
                "signal still shows {} after forced RED write",
                signal.current_aspect
            )),
            Ok(None) => Err("signal disappeared during enforcement".to_string()),
            Err(err) => Err(format!("confirmation read failed: {err}")),
        }
    }
}

enum ForceResult {
    AlreadySafe,
    Forced,
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixtures, store::MemoryStore};

    fn operator() -> OperatorId {
        OperatorId::new("HMI_USER")
    }

    fn branch(store: &Arc<MemoryStore>) -> TrackCircuitBranch {
        TrackCircuitBranch::new(Arc::clone(store) as Arc<dyn StateStore>)
    }

    fn assign(branch: &TrackCircuitBranch, track_id: &str) -> ValidationResult {
        branch
            .validate_track_assignment(&TrackId::new(track_id), false, true, &operator())
            .unwrap()
    }

    fn unassign(branch: &TrackCircuitBranch, track_id: &str) -> ValidationResult {
        branch
            .validate_track_assignment(&TrackId::new(track_id), true, false, &operator())
            .unwrap()
    }

    #[test]
    fn test_unknown_track_is_blocked() {
        let store = Arc::new(MemoryStore::new());

        let result = assign(&branch(&store), "6T");

        assert!(result.is_blocked());
        assert_eq!(result.rule_id(), Some(RuleId::TrackNotFound));
    }

    #[test]
    fn test_inactive_track_is_blocked() {
        let mut section = fixtures::track("6T");
        section.is_active = false;
        let store = Arc::new(MemoryStore::new().with_track(section));

        assert_eq!(
            assign(&branch(&store), "6T").rule_id(),
            Some(RuleId::TrackInactive)
        );
    }

    #[test]
    fn test_no_op_request_is_allowed() {
        let store = Arc::new(MemoryStore::new().with_track(fixtures::track("6T")));

        let result = branch(&store)
            .validate_track_assignment(&TrackId::new("6T"), false, false, &operator())
            .unwrap();

        assert!(result.is_allowed());
        assert!(result.reason().contains("No change required"));
    }

    #[test]
    fn test_cannot_assign_occupied_track() {
        let store = Arc::new(MemoryStore::new().with_track(fixtures::occupied_track("6T", "TRAIN_42")));

        let result = assign(&branch(&store), "6T");

        assert_eq!(result.rule_id(), Some(RuleId::TrackOccupied));
        assert!(result.reason().contains("TRAIN_42"));
    }

    #[test]
    fn test_cannot_unassign_occupied_track() {
        let mut section = fixtures::occupied_track("6T", "TRAIN_42");
        section.assigned = true;
        let store = Arc::new(MemoryStore::new().with_track(section));

        assert_eq!(
            unassign(&branch(&store), "6T").rule_id(),
            Some(RuleId::TrackStillOccupied)
        );
    }

    #[test]
    fn test_assignment_requires_protecting_signals_at_red() {
        let store = Arc::new(
            MemoryStore::new()
                .with_track(fixtures::track("6T"))
                .with_signal(fixtures::signal("OT001", Aspect::Green))
                .with_protection_row("OT001", "6T"),
        );

        assert_eq!(
            assign(&branch(&store), "6T").rule_id(),
            Some(RuleId::ProtectingSignalsNotSafe)
        );
    }

    #[test]
    fn test_assignment_allowed_when_protecting_signals_at_red() {
        let store = Arc::new(
            MemoryStore::new()
                .with_track(fixtures::track("6T"))
                .with_signal(fixtures::signal("OT001", Aspect::Red))
                .with_protection_row("OT001", "6T"),
        );

        let result = assign(&branch(&store), "6T");

        assert!(result.is_allowed(), "{}", result.reason());
    }

    #[test]
    fn test_cannot_assign_approach_locked_track() {
        let mut section = fixtures::track("6T");
        section.approach_locked_by = Some(SignalId::new("HM001"));
        let store = Arc::new(
            MemoryStore::new()
                .with_track(section)
                .with_signal(fixtures::signal("HM001", Aspect::Red)),
        );

        let result = assign(&branch(&store), "6T");

        assert_eq!(result.rule_id(), Some(RuleId::ApproachLocked));
        assert_eq!(
            result.affected_entities(),
            &[EntityId::Signal(SignalId::new("HM001"))]
        );
    }

    #[test]
    fn test_unassign_blocked_while_locking_signal_not_red() {
        let mut section = fixtures::track("6T");
        section.assigned = true;
        section.approach_locked_by = Some(SignalId::new("HM001"));
        let store = Arc::new(
            MemoryStore::new()
                .with_track(section)
                .with_signal(fixtures::signal("HM001", Aspect::Green)),
        );

        assert_eq!(
            unassign(&branch(&store), "6T").rule_id(),
            Some(RuleId::ApproachLockActive)
        );
    }

    #[test]
    fn test_unassign_allowed_once_locking_signal_back_at_red() {
        let mut section = fixtures::track("6T");
        section.assigned = true;
        section.approach_locked_by = Some(SignalId::new("HM001"));
        let store = Arc::new(
            MemoryStore::new()
                .with_track(section)
                .with_signal(fixtures::signal("HM001", Aspect::Red)),
        );

        assert!(unassign(&branch(&store), "6T").is_allowed());
    }

    #[test]
    fn test_conflicting_assigned_track_blocks_assignment() {
        let mut section = fixtures::track("6T");
        section.conflicting_tracks = vec![TrackId::new("7T")];
        let mut conflicting = fixtures::track("7T");
        conflicting.assigned = true;
        let store = Arc::new(MemoryStore::new().with_track(section).with_track(conflicting));

        let result = assign(&branch(&store), "6T");

        assert_eq!(result.rule_id(), Some(RuleId::ConflictingTrackAssigned));
        assert_eq!(
            result.affected_entities(),
            &[EntityId::Track(TrackId::new("7T"))]
        );
    }

    #[test]
    fn test_enforcement_ignores_non_critical_transitions() {
        let store = Arc::new(
            MemoryStore::new()
                .with_track(fixtures::occupied_track("6T", "TRAIN_42"))
                .with_signal(fixtures::signal("OT001", Aspect::Green))
                .with_protection_row("OT001", "6T"),
        );
        let branch = branch(&store);

        for (was, is) in [(true, true), (true, false), (false, false)] {
            let outcome = branch
                .enforce_occupancy_interlocking(&TrackId::new("6T"), was, is)
                .unwrap();

            assert_eq!(outcome.signals_covered(), 0);
            assert!(store.aspect_writes().is_empty());
        }
    }

    #[test]
    fn test_enforcement_forces_protecting_signals_to_red() {
        // Scenario: 6T becomes occupied; OT001 currently GREEN.
        let store = Arc::new(
            MemoryStore::new()
                .with_track(fixtures::occupied_track("6T", "TRAIN_42"))
                .with_signal(fixtures::signal("OT001", Aspect::Green))
                .with_protection_row("OT001", "6T"),
        );

        let outcome = branch(&store)
            .enforce_occupancy_interlocking(&TrackId::new("6T"), false, true)
            .unwrap();

        assert!(outcome.is_fully_enforced());
        assert_eq!(outcome.forced, vec![SignalId::new("OT001")]);
        assert_eq!(
            store.signal_aspect(&SignalId::new("OT001")),
            Some(Aspect::Red)
        );
    }

    #[test]
    fn test_enforcement_is_idempotent_per_signal() {
        let store = Arc::new(
            MemoryStore::new()
                .with_track(fixtures::occupied_track("6T", "TRAIN_42"))
                .with_signal(fixtures::signal("OT001", Aspect::Green))
                .with_protection_row("OT001", "6T"),
        );
        let branch = branch(&store);
        let track_id = TrackId::new("6T");

        let first = branch
            .enforce_occupancy_interlocking(&track_id, false, true)
            .unwrap();
        assert_eq!(first.forced.len(), 1);
        assert_eq!(store.aspect_writes().len(), 1);

        // Track already occupied: the repeat pass must not write again.
        let second = branch
            .enforce_occupancy_interlocking(&track_id, false, true)
            .unwrap();
        assert!(second.forced.is_empty());
        assert_eq!(second.already_safe, vec![SignalId::new("OT001")]);
        assert_eq!(store.aspect_writes().len(), 1);
    }

    #[test]
    fn test_enforcement_unions_both_protection_sources() {
        let mut section = fixtures::occupied_track("6T", "TRAIN_42");
        section.protecting_signals = vec![SignalId::new("HM001"), SignalId::new("OT001")];
        let store = Arc::new(
            MemoryStore::new()
                .with_track(section)
                .with_signal(fixtures::signal("OT001", Aspect::Green))
                .with_signal(fixtures::signal("HM001", Aspect::Yellow))
                .with_protection_row("OT001", "6T"),
        );

        let outcome = branch(&store)
            .enforce_occupancy_interlocking(&TrackId::new("6T"), false, true)
            .unwrap();

        // Table row first, then the embedded entry; OT001 not duplicated.
        assert_eq!(
            outcome.forced,
            vec![SignalId::new("OT001"), SignalId::new("HM001")]
        );
        assert_eq!(store.aspect_writes().len(), 2);
    }

    #[test]
    fn test_enforcement_with_no_protecting_signals_takes_no_action() {
        let store = Arc::new(MemoryStore::new().with_track(fixtures::occupied_track("6T", "TRAIN_42")));

        let outcome = branch(&store)
            .enforce_occupancy_interlocking(&TrackId::new("6T"), false, true)
            .unwrap();

        assert!(outcome.unprotected);
        assert_eq!(outcome.signals_covered(), 0);
        assert!(store.aspect_writes().is_empty());
    }

    #[test]
    fn test_unconfirmed_write_is_a_failure_and_does_not_abort_others() {
        // HM001 acknowledges the write but never changes aspect.
        let store = Arc::new(
            MemoryStore::new()
                .with_track(fixtures::occupied_track("6T", "TRAIN_42"))
                .with_signal(fixtures::signal("HM001", Aspect::Green))
                .with_signal(fixtures::signal("OT001", Aspect::Green))
                .with_protection_row("HM001", "6T")
                .with_protection_row("OT001", "6T"),
        );
        store.stick_signal(&SignalId::new("HM001"));

        let outcome = branch(&store)
            .enforce_occupancy_interlocking(&TrackId::new("6T"), false, true)
            .unwrap();

        assert!(!outcome.is_fully_enforced());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].signal_id, SignalId::new("HM001"));
        // The second signal was still enforced.
        assert_eq!(outcome.forced, vec![SignalId::new("OT001")]);
        assert_eq!(
            store.signal_aspect(&SignalId::new("OT001")),
            Some(Aspect::Red)
        );
    }
}
