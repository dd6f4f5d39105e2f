use log::warn;
use std::{
    collections::VecDeque,
    sync::{Mutex, PoisonError},
    time::Duration,
};

/// Most recent validation durations retained for the rolling mean.
pub(crate) const MAX_RESPONSE_HISTORY: usize = 1000;

/// Validations slower than this are logged as warnings.
pub(crate) const SLOW_RESPONSE: Duration = Duration::from_millis(50);

///
/// ResponseTimes
///
/// Bounded history of validation wall-clock durations. Validations may
/// be dispatched from more than one source, so this is the one shared
/// mutable resource in the core and it sits behind a mutex.
///

#[derive(Debug, Default)]
pub struct ResponseTimes {
    history: Mutex<VecDeque<Duration>>,
}

impl ResponseTimes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one validation duration, warning on slow responses.
    pub fn record(&self, operation: &str, elapsed: Duration) {
        if elapsed > SLOW_RESPONSE {
            warn!(
                "slow interlocking response: {elapsed:?} for {operation} (target: {SLOW_RESPONSE:?})"
            );
        }

        let mut history = self.lock();
        history.push_back(elapsed);
        if history.len() > MAX_RESPONSE_HISTORY {
            history.pop_front();
        }
    }

    /// Rolling mean over the retained history.
    #[must_use]
    pub fn average(&self) -> Duration {
        let history = self.lock();
        if history.is_empty() {
            return Duration::ZERO;
        }

        let total: Duration = history.iter().sum();

        total / u32::try_from(history.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn samples(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Duration>> {
        // A poisoned history is telemetry, not safety state; keep serving.
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

///
/// TESTS
///
