//! Data-driven interlocking rules.
//!
//! Complex multi-signal dependency chains that pairwise interlocking
//! cannot express are configured externally as a per-signal
//! "controlled-by" document and evaluated against live field state.

use crate::store::{StateStore, StoreError};
use lockframe_types::prelude::*;
use log::{debug, warn};
use serde::Deserialize;
use std::{collections::HashMap, io::Read, sync::Arc};
use thiserror::Error as ThisError;

///
/// RuleLoadError
///

#[remain::sorted]
#[derive(Debug, ThisError)]
pub enum RuleLoadError {
    #[error("cannot read interlocking rules: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid interlocking rules document: {0}")]
    Parse(#[from] serde_json::Error),
}

///
/// RuleCondition
///
/// Extra condition attached to a rule; all conditions must hold for the
/// rule to apply. Track-segment occupancy is declared by the document
/// format but not supported yet: such a condition always evaluates
/// false, never silently passes.
///

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum RuleCondition {
    PointMachinePosition {
        point_machine: PointMachineId,
        position: PointPosition,
    },
    TrackOccupancy {
        track_segment: TrackId,
        occupancy: String,
    },
}

///
/// SignalRule
///
/// "When the controlling signal shows `when_aspect` and `conditions`
/// hold, the signals in `allows` may show the listed aspects."
///

#[derive(Clone, Debug, Deserialize)]
pub struct SignalRule {
    pub when_aspect: Aspect,
    #[serde(default)]
    pub conditions: Vec<RuleCondition>,
    #[serde(default)]
    pub allows: HashMap<SignalId, Vec<Aspect>>,
}

///
/// SignalRuleInfo
///

#[derive(Clone, Debug, Deserialize)]
pub struct SignalRuleInfo {
    #[serde(default, rename = "type")]
    pub kind: Option<SignalKind>,
    #[serde(default)]
    pub independent: bool,
    #[serde(default)]
    pub controlled_by: Vec<SignalId>,
    #[serde(default)]
    pub rules: Vec<SignalRule>,
}

///
/// RuleSet
///
/// The externally configured rule document, keyed by signal.
///

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RuleSet {
    #[serde(default, rename = "signal_interlocking_rules")]
    signals: HashMap<SignalId, SignalRuleInfo>,
}

impl RuleSet {
    pub fn from_json_str(json: &str) -> Result<Self, RuleLoadError> {
        let rules: Self = serde_json::from_str(json)?;
        debug!("loaded interlocking rules for {} signals", rules.len());

        Ok(rules)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, RuleLoadError> {
        let rules: Self = serde_json::from_reader(reader)?;
        debug!("loaded interlocking rules for {} signals", rules.len());

        Ok(rules)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    #[must_use]
    pub fn contains_signal(&self, signal_id: &SignalId) -> bool {
        self.signals.contains_key(signal_id)
    }

    fn info(&self, signal_id: &SignalId) -> Option<&SignalRuleInfo> {
        self.signals.get(signal_id)
    }
}

///
/// InterlockingRuleEngine
///
/// Evaluates the configured rule set against live field state. Optional:
/// layouts without complex dependency chains never construct one.
///

pub struct InterlockingRuleEngine {
    store: Arc<dyn StateStore>,
    rules: RuleSet,
}

impl InterlockingRuleEngine {
    pub fn new(store: Arc<dyn StateStore>, rules: RuleSet) -> Self {
        Self { store, rules }
    }

    #[must_use]
    pub const fn rules(&self) -> &RuleSet {
        &self.rules
    }

    #[must_use]
    pub fn contains_signal(&self, signal_id: &SignalId) -> bool {
        self.rules.contains_signal(signal_id)
    }

    #[must_use]
    pub fn is_independent(&self, signal_id: &SignalId) -> bool {
        self.rules
            .info(signal_id)
            .is_some_and(|info| info.independent)
    }

    /// Signals listed as controlling `signal_id`.
    #[must_use]
    pub fn controlling_signals(&self, signal_id: &SignalId) -> Vec<SignalId> {
        self.rules
            .info(signal_id)
            .map(|info| info.controlled_by.clone())
            .unwrap_or_default()
    }

    /// Signals whose aspects the rules of `signal_id` constrain.
    #[must_use]
    pub fn controlled_signals(&self, signal_id: &SignalId) -> Vec<SignalId> {
        let mut controlled: Vec<SignalId> = Vec::new();
        if let Some(info) = self.rules.info(signal_id) {
            for rule in &info.rules {
                for allowed_id in rule.allows.keys() {
                    if !controlled.contains(allowed_id) {
                        controlled.push(allowed_id.clone());
                    }
                }
            }
        }

        controlled
    }

    pub fn validate_interlocked_signal_aspect_change(
        &self,
        signal_id: &SignalId,
        current: Aspect,
        requested: Aspect,
    ) -> Result<ValidationResult, StoreError> {
        debug!("rule engine evaluating {signal_id}: {current} -> {requested}");

        let Some(info) = self.rules.info(signal_id) else {
            return Ok(ValidationResult::blocked(
                format!("Signal {signal_id} not found in interlocking rules"),
                RuleId::SignalNotInRules,
            ));
        };

        if info.independent {
            return Ok(ValidationResult::allowed(
                "Independent signal - no interlocking restrictions",
            ));
        }

        for controller_id in &info.controlled_by {
            // Controllers without a rule entry of their own cannot restrict.
            let Some(controller_info) = self.rules.info(controller_id) else {
                continue;
            };

            let controller_aspect = self.current_aspect_or_red(controller_id)?;

            let mut aspect_allowed = false;
            for rule in &controller_info.rules {
                if rule.when_aspect != controller_aspect {
                    continue;
                }

                if !self.conditions_hold(&rule.conditions)? {
                    continue;
                }

                if rule
                    .allows
                    .get(signal_id)
                    .is_some_and(|aspects| aspects.contains(&requested))
                {
                    aspect_allowed = true;
                    break;
                }
            }

            if !aspect_allowed {
                return Ok(ValidationResult::blocked(
                    format!(
                        "Signal {signal_id} cannot show {requested}: controlling signal {controller_id} shows {controller_aspect}"
                    ),
                    RuleId::ControllingSignalRestriction,
                )
                .with_affected(controller_id.clone()));
            }
        }

        Ok(ValidationResult::allowed(
            "All controlling signals permit the requested aspect",
        ))
    }

    /// A controller that cannot be read defaults to RED, its most
    /// restrictive aspect.
    fn current_aspect_or_red(&self, signal_id: &SignalId) -> Result<Aspect, StoreError> {
        let aspect = self
            .store
            .signal(signal_id)?
            .map_or(Aspect::Red, |signal| signal.current_aspect);

        Ok(aspect)
    }

    fn conditions_hold(&self, conditions: &[RuleCondition]) -> Result<bool, StoreError> {
        for condition in conditions {
            match condition {
                RuleCondition::PointMachinePosition {
                    point_machine,
                    position,
                } => {
                    let actual = self
                        .store
                        .point_machine(point_machine)?
                        .map_or(PointPosition::Normal, |machine| machine.position);

                    if actual != *position {
                        debug!(
                            "condition failed: point machine {point_machine} is {actual} but rule requires {position}"
                        );
                        return Ok(false);
                    }
                }
                RuleCondition::TrackOccupancy { track_segment, .. } => {
                    warn!(
                        "track segment condition on {track_segment} is not supported yet; rule cannot be satisfied"
                    );
                    return Ok(false);
                }
            }
        }

        Ok(true)
    }
}

///
/// TESTS
///
