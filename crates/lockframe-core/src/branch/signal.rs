use crate::{
    branch::protection::{ProtectedTrackSources, Reconciliation},
    store::{StateStore, StoreError},
};
use lockframe_types::prelude::*;
use log::{debug, error, warn};
use std::sync::Arc;

///
/// SignalBranch
///
/// Validates requested signal-aspect changes: transition legality, track
/// protection, and cross-signal interlocking. Short-circuits on the
/// first blocking rule.
///

pub struct SignalBranch {
    store: Arc<dyn StateStore>,
}

impl SignalBranch {
    pub(crate) fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    pub fn validate_aspect_change(
        &self,
        signal_id: &SignalId,
        current: Aspect,
        requested: Aspect,
        operator: &OperatorId,
    ) -> Result<ValidationResult, StoreError> {
        debug!("validating aspect change {current} -> {requested} on {signal_id} for {operator}");

        let Some(signal) = self.store.signal(signal_id)? else {
            return Ok(ValidationResult::blocked(
                format!("Signal not found: {signal_id}"),
                RuleId::SignalNotFound,
            ));
        };

        if !signal.is_active {
            return Ok(ValidationResult::blocked(
                format!("Signal is not active: {signal_id}"),
                RuleId::SignalInactive,
            ));
        }

        if requested == current {
            return Ok(ValidationResult::allowed(format!(
                "No change required - signal {signal_id} already shows {requested}"
            )));
        }

        if let Some(blocked) = Self::check_basic_transition(&signal, current, requested) {
            return Ok(blocked);
        }

        if let Some(blocked) = self.check_track_protection(&signal, requested)? {
            return Ok(blocked);
        }

        if let Some(blocked) = self.check_interlocked_signals(&signal, requested)? {
            return Ok(blocked);
        }

        Ok(ValidationResult::allowed("All signal validations passed"))
    }

    /// Aspect-capability and group-transition legality.
    fn check_basic_transition(
        signal: &Signal,
        current: Aspect,
        requested: Aspect,
    ) -> Option<ValidationResult> {
        // RED is always reachable for emergency stops.
        if requested == Aspect::Red {
            return None;
        }

        if !signal.supports(requested) {
            return Some(ValidationResult::blocked(
                format!(
                    "Aspect {requested} not supported by {} signal {}",
                    signal.kind, signal.id
                ),
                RuleId::AspectNotSupported,
            ));
        }

        if current.group() != requested.group()
            && !Aspect::is_whitelisted_crossing(current, requested)
        {
            return Some(ValidationResult::blocked(
                format!(
                    "Invalid aspect transition from {current} to {requested} for signal {}",
                    signal.id
                ),
                RuleId::InvalidTransition,
            ));
        }

        None
    }

    /// Triple-redundant protected-track resolution and occupancy check.
    fn check_track_protection(
        &self,
        signal: &Signal,
        requested: Aspect,
    ) -> Result<Option<ValidationResult>, StoreError> {
        // Only RED is exempt: calling-on movements still require the
        // protected tracks to be clear.
        if requested == Aspect::Red {
            return Ok(None);
        }

        let sources = ProtectedTrackSources {
            signal_data: signal.protected_tracks.clone(),
            interlocking_rules: self.store.rule_protected_tracks(&signal.id)?,
            protection_table: self.store.protected_tracks(&signal.id)?,
        };

        let authoritative = match sources.reconcile() {
            Reconciliation::Inconsistent { sources } => {
                let names: Vec<&str> = sources.iter().map(|source| source.as_str()).collect();
                error!(
                    "SAFETY: protected-track sources disagree for signal {}: {}",
                    signal.id,
                    names.join(", ")
                );

                return Ok(Some(ValidationResult::blocked(
                    format!(
                        "Cannot clear signal {}: protected tracks mismatch between {}",
                        signal.id,
                        names.join(" and ")
                    ),
                    RuleId::TrackProtectionValidationFailed,
                )));
            }
            Reconciliation::Consistent { authoritative } => authoritative,
        };

        if authoritative.is_empty() {
            return Ok(Some(ValidationResult::blocked(
                format!(
                    "Cannot clear signal {}: no protected tracks found in any source",
                    signal.id
                ),
                RuleId::TrackProtectionValidationFailed,
            )));
        }

        let mut occupied: Vec<(TrackId, String)> = Vec::new();
        for track_id in &authoritative {
            let Some(section) = self.store.track_section(track_id)? else {
                error!(
                    "SAFETY: protected track {track_id} of signal {} not found",
                    signal.id
                );

                return Ok(Some(
                    ValidationResult::blocked(
                        format!(
                            "Cannot clear signal {}: protected track {track_id} not found",
                            signal.id
                        ),
                        RuleId::TrackProtectionValidationFailed,
                    )
                    .with_affected(track_id.clone()),
                ));
            };

            if section.occupied {
                warn!(
                    "SAFETY: protected track {track_id} is occupied by {}",
                    section.occupier()
                );
                occupied.push((track_id.clone(), section.occupier().to_string()));
            }
        }

        if occupied.is_empty() {
            return Ok(None);
        }

        let names: Vec<String> = occupied
            .iter()
            .map(|(track_id, by)| format!("{track_id} (occupied by {by})"))
            .collect();

        let mut result = ValidationResult::blocked(
            format!(
                "Cannot clear signal {}: protected tracks are occupied: {}",
                signal.id,
                names.join(", ")
            ),
            RuleId::TrackOccupied,
        );
        for (track_id, _) in occupied {
            result = result.with_affected(track_id);
        }

        Ok(Some(result))
    }

    /// Opposing-signal rule: two interlocked signals may never both show
    /// proceed aspects.
    fn check_interlocked_signals(
        &self,
        signal: &Signal,
        requested: Aspect,
    ) -> Result<Option<ValidationResult>, StoreError> {
        if !requested.is_proceed() {
            return Ok(None);
        }

        for interlocked_id in &signal.interlocked_with {
            let Some(interlocked) = self.store.signal(interlocked_id)? else {
                continue;
            };

            if interlocked.current_aspect.is_proceed() {
                return Ok(Some(
                    ValidationResult::blocked(
                        format!(
                            "Cannot set {} to {requested}: interlocked signal {interlocked_id} shows {}",
                            signal.id, interlocked.current_aspect
                        ),
                        RuleId::InterlockedSignalConflict,
                    )
                    .with_affected(interlocked_id.clone()),
                ));
            }
        }

        Ok(None)
    }
}

///
/// TESTS
///
