//! Core runtime for the lockframe interlocking system: the persistence
//! abstraction, the validation branches, the data-driven rule engine, and
//! the service façade with its observability boundary.
//!
//! The core is invoked from a single-threaded, event-driven dispatch
//! context. It holds no entity state of its own: every validation and
//! every enforcement re-reads current committed state through
//! [`store::StateStore`], because a stale read is a safety hazard.

pub mod branch;
pub mod obs;
pub mod rules;
pub mod service;
pub mod store;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Prelude contains the construction and validation surface consumers
/// need; branch internals are one module level down.
///

pub mod prelude {
    pub use crate::{
        branch::{EnforcementFailure, EnforcementOutcome},
        obs::{EventSink, InterlockingEvent, NullEventSink},
        rules::{InterlockingRuleEngine, RuleLoadError, RuleSet},
        service::InterlockingService,
        store::{StateStore, StoreError},
    };
    pub use lockframe_types::prelude::*;
}
