use crate::{
    branch::{PointMachineBranch, SignalBranch, TrackCircuitBranch},
    obs::{EventSink, InterlockingEvent, ResponseTimes},
    rules::{InterlockingRuleEngine, RuleSet},
    store::{StateStore, StoreError},
};
use lockframe_types::prelude::*;
use log::{debug, error, warn};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

///
/// InterlockingService
///
/// Façade and orchestrator: owns one instance of each validation branch,
/// the persistence handle, and the event boundary, all injected at
/// construction, with no ambient globals. Operator-command handling calls
/// the `validate_*` entry points before any state change is persisted;
/// the hardware-notification handler calls
/// [`react_to_track_occupancy_change`](Self::react_to_track_occupancy_change),
/// which enforces rather than merely validates.
///

pub struct InterlockingService {
    store: Arc<dyn StateStore>,
    sink: Arc<dyn EventSink>,
    signal_branch: SignalBranch,
    point_branch: PointMachineBranch,
    track_branch: TrackCircuitBranch,
    rule_engine: Option<InterlockingRuleEngine>,
    operational: AtomicBool,
    response_times: ResponseTimes,
}

impl InterlockingService {
    pub fn new(store: Arc<dyn StateStore>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            signal_branch: SignalBranch::new(Arc::clone(&store)),
            point_branch: PointMachineBranch::new(Arc::clone(&store)),
            track_branch: TrackCircuitBranch::new(Arc::clone(&store)),
            rule_engine: None,
            operational: AtomicBool::new(false),
            response_times: ResponseTimes::new(),
            store,
            sink,
        }
    }

    /// Attach the data-driven rule engine. Signals covered by the rule
    /// document get its verdict on top of the signal branch pipeline.
    #[must_use]
    pub fn with_rule_engine(mut self, rules: RuleSet) -> Self {
        self.rule_engine = Some(InterlockingRuleEngine::new(Arc::clone(&self.store), rules));
        self
    }

    #[must_use]
    pub const fn rule_engine(&self) -> Option<&InterlockingRuleEngine> {
        self.rule_engine.as_ref()
    }

    /// Bring the service operational if the persistence layer is
    /// reachable. Also the recovery path after a critical failure.
    pub fn initialize(&self) -> bool {
        let connected = self.store.is_connected();
        if !connected {
            warn!("cannot initialize interlocking: persistence layer not connected");
        }
        self.set_operational(connected);

        connected
    }

    #[must_use]
    pub fn is_operational(&self) -> bool {
        self.operational.load(Ordering::SeqCst)
    }

    /// Rolling mean over the recorded validation durations.
    #[must_use]
    pub fn average_response_time(&self) -> Duration {
        self.response_times.average()
    }

    // -------------------------------------------------------------------
    // Validation entry points (operator-initiated actions only)
    // -------------------------------------------------------------------

    pub fn validate_signal_operation(
        &self,
        signal_id: &SignalId,
        current: Aspect,
        requested: Aspect,
        operator: &OperatorId,
    ) -> ValidationResult {
        let started = Instant::now();
        if !self.is_operational() {
            return Self::offline_result();
        }

        let result = self
            .signal_branch
            .validate_aspect_change(signal_id, current, requested, operator)
            .and_then(|result| {
                if !result.is_allowed() {
                    return Ok(result);
                }

                // Signals covered by the configured rule document also
                // need their controlling signals' consent.
                match &self.rule_engine {
                    Some(engine) if engine.contains_signal(signal_id) => {
                        engine.validate_interlocked_signal_aspect_change(
                            signal_id, current, requested,
                        )
                    }
                    _ => Ok(result),
                }
            });

        self.finish_validation(
            "signal validation",
            started,
            EntityId::Signal(signal_id.clone()),
            result,
        )
    }

    pub fn validate_point_machine_operation(
        &self,
        machine_id: &PointMachineId,
        current: PointPosition,
        requested: PointPosition,
        operator: &OperatorId,
    ) -> ValidationResult {
        let started = Instant::now();
        if !self.is_operational() {
            return Self::offline_result();
        }

        let result =
            self.point_branch
                .validate_position_change(machine_id, current, requested, operator);

        self.finish_validation(
            "point machine validation",
            started,
            EntityId::PointMachine(machine_id.clone()),
            result,
        )
    }

    pub fn validate_track_assignment(
        &self,
        track_id: &TrackId,
        currently_assigned: bool,
        requested_assignment: bool,
        operator: &OperatorId,
    ) -> ValidationResult {
        let started = Instant::now();
        if !self.is_operational() {
            return Self::offline_result();
        }

        let result = self.track_branch.validate_track_assignment(
            track_id,
            currently_assigned,
            requested_assignment,
            operator,
        );

        self.finish_validation(
            "track assignment validation",
            started,
            EntityId::Track(track_id.clone()),
            result,
        )
    }

    // -------------------------------------------------------------------
    // Reactive interlocking (hardware-driven occupancy changes)
    // -------------------------------------------------------------------

    /// Hardware notification that `track_id` changed occupancy. Only the
    /// `false -> true` transition triggers enforcement; the branch
    /// checks the transition again for defense in depth.
    pub fn react_to_track_occupancy_change(
        &self,
        track_id: &TrackId,
        was_occupied: bool,
        is_occupied: bool,
    ) {
        if !self.is_operational() {
            error!("interlocking offline during occupancy change on {track_id}");
            self.sink.publish(InterlockingEvent::SystemFreezeRequired {
                entity: EntityId::Track(track_id.clone()),
                reason: "Interlocking system not operational".to_string(),
                detail: format!(
                    "Track occupancy change detected while system offline: {track_id}"
                ),
            });
            return;
        }

        if was_occupied || !is_occupied {
            debug!("non-critical occupancy transition on {track_id}; no interlocking action");
            return;
        }

        match self
            .track_branch
            .enforce_occupancy_interlocking(track_id, was_occupied, is_occupied)
        {
            Ok(outcome) if outcome.is_fully_enforced() => {
                if outcome.signals_covered() > 0 {
                    self.sink
                        .publish(InterlockingEvent::AutomaticProtectionActivated {
                            entity: EntityId::Track(track_id.clone()),
                            reason: format!(
                                "Automatic signal protection activated for {} signals",
                                outcome.signals_covered()
                            ),
                        });
                }
            }
            Ok(outcome) => {
                // An unconfirmed forced write means a train may proceed
                // into an occupied track with a signal still off RED.
                let failed: Vec<String> = outcome
                    .failures
                    .iter()
                    .map(|failure| failure.signal_id.to_string())
                    .collect();
                let detail: Vec<String> = outcome
                    .failures
                    .iter()
                    .map(|failure| format!("{}: {}", failure.signal_id, failure.detail))
                    .collect();

                self.critical_failure(
                    EntityId::Track(track_id.clone()),
                    format!("Failed to enforce signal protection: {}", failed.join(", ")),
                    detail.join("; "),
                );
            }
            Err(err) => {
                self.critical_failure(
                    EntityId::Track(track_id.clone()),
                    "Failed to enforce signal protection".to_string(),
                    err.to_string(),
                );
            }
        }
    }

    // -------------------------------------------------------------------
    // Internal
    // -------------------------------------------------------------------

    fn offline_result() -> ValidationResult {
        ValidationResult::blocked("Interlocking system not operational", RuleId::SystemOffline)
    }

    fn finish_validation(
        &self,
        operation: &str,
        started: Instant,
        entity: EntityId,
        result: Result<ValidationResult, StoreError>,
    ) -> ValidationResult {
        match result {
            Ok(result) => {
                self.response_times.record(operation, started.elapsed());
                debug!("{operation} completed for {entity}: {}", result.reason());

                if !result.is_allowed() {
                    self.sink.publish(InterlockingEvent::OperationBlocked {
                        entity,
                        reason: result.reason().to_string(),
                    });
                }

                result
            }
            Err(err) => {
                error!("persistence failure during {operation} for {entity}: {err}");
                self.set_operational(false);

                ValidationResult::blocked(
                    format!("Interlocking system not operational: {err}"),
                    RuleId::SystemOffline,
                )
            }
        }
    }

    /// Escalation path for enforcement failures: freeze the console,
    /// flag the violation, and stop validating until re-initialized.
    fn critical_failure(&self, entity: EntityId, reason: String, detail: String) {
        error!("INTERLOCKING CRITICAL FAILURE for {entity}: {reason} ({detail})");

        self.sink.publish(InterlockingEvent::SystemFreezeRequired {
            entity: entity.clone(),
            reason,
            detail: detail.clone(),
        });
        self.sink
            .publish(InterlockingEvent::CriticalSafetyViolation { entity, detail });
        self.set_operational(false);
    }

    fn set_operational(&self, operational: bool) {
        self.operational.store(operational, Ordering::SeqCst);
        self.sink
            .publish(InterlockingEvent::OperationalStateChanged { operational });
    }
}

///
/// TESTS
///
