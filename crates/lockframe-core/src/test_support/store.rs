use crate::store::{StateStore, StoreError};
use lockframe_types::prelude::*;
use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard, PoisonError},
};

///
/// MemoryStore
///
/// In-memory `StateStore` double. Builder methods seed the layout;
/// runtime mutators simulate hardware and connectivity changes. Every
/// aspect write is logged so tests can assert on write counts, and a
/// "stuck" signal acknowledges writes without applying them to exercise
/// the enforcement confirmation path.
///

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    signals: HashMap<SignalId, Signal>,
    machines: HashMap<PointMachineId, PointMachine>,
    tracks: HashMap<TrackId, TrackSection>,
    /// Rows of the signal-to-track protection table.
    protection_rows: Vec<(SignalId, TrackId)>,
    /// Rows of the interlocking-rule table (signal protects track).
    rule_rows: Vec<(SignalId, TrackId)>,
    stuck_signals: HashSet<SignalId>,
    aspect_writes: Vec<(SignalId, Aspect)>,
    connected: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        let store = Self::default();
        store.lock().connected = true;

        store
    }

    // builder

    pub fn with_signal(self, signal: Signal) -> Self {
        self.lock().signals.insert(signal.id.clone(), signal);
        self
    }

    pub fn with_machine(self, machine: PointMachine) -> Self {
        self.lock().machines.insert(machine.id.clone(), machine);
        self
    }

    pub fn with_track(self, section: TrackSection) -> Self {
        self.lock().tracks.insert(section.id.clone(), section);
        self
    }

    pub fn with_protection_row(self, signal_id: &str, track_id: &str) -> Self {
        self.lock()
            .protection_rows
            .push((SignalId::new(signal_id), TrackId::new(track_id)));
        self
    }

    pub fn with_rule_row(self, signal_id: &str, track_id: &str) -> Self {
        self.lock()
            .rule_rows
            .push((SignalId::new(signal_id), TrackId::new(track_id)));
        self
    }

    pub fn disconnected(self) -> Self {
        self.lock().connected = false;
        self
    }

    // runtime mutators

    pub fn set_connected(&self, connected: bool) {
        self.lock().connected = connected;
    }

    /// Writes to this signal are acknowledged but never applied.
    pub fn stick_signal(&self, signal_id: &SignalId) {
        self.lock().stuck_signals.insert(signal_id.clone());
    }

    // inspection

    pub fn aspect_writes(&self) -> Vec<(SignalId, Aspect)> {
        self.lock().aspect_writes.clone()
    }

    pub fn signal_aspect(&self, signal_id: &SignalId) -> Option<Aspect> {
        self.lock()
            .signals
            .get(signal_id)
            .map(|signal| signal.current_aspect)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn guard_connected(inner: &Inner) -> Result<(), StoreError> {
        if inner.connected {
            Ok(())
        } else {
            Err(StoreError::Disconnected)
        }
    }
}

impl StateStore for MemoryStore {
    fn signal(&self, id: &SignalId) -> Result<Option<Signal>, StoreError> {
        let inner = self.lock();
        Self::guard_connected(&inner)?;

        Ok(inner.signals.get(id).cloned())
    }

    fn point_machine(&self, id: &PointMachineId) -> Result<Option<PointMachine>, StoreError> {
        let inner = self.lock();
        Self::guard_connected(&inner)?;

        Ok(inner.machines.get(id).cloned())
    }

    fn track_section(&self, id: &TrackId) -> Result<Option<TrackSection>, StoreError> {
        let inner = self.lock();
        Self::guard_connected(&inner)?;

        Ok(inner.tracks.get(id).cloned())
    }

    fn protected_tracks(&self, signal_id: &SignalId) -> Result<Vec<TrackId>, StoreError> {
        let inner = self.lock();
        Self::guard_connected(&inner)?;

        Ok(inner
            .protection_rows
            .iter()
            .filter(|(signal, _)| signal == signal_id)
            .map(|(_, track)| track.clone())
            .collect())
    }

    fn rule_protected_tracks(&self, signal_id: &SignalId) -> Result<Vec<TrackId>, StoreError> {
        let inner = self.lock();
        Self::guard_connected(&inner)?;

        Ok(inner
            .rule_rows
            .iter()
            .filter(|(signal, _)| signal == signal_id)
            .map(|(_, track)| track.clone())
            .collect())
    }

    fn protecting_signals(&self, track_id: &TrackId) -> Result<Vec<SignalId>, StoreError> {
        let inner = self.lock();
        Self::guard_connected(&inner)?;

        Ok(inner
            .protection_rows
            .iter()
            .filter(|(_, track)| track == track_id)
            .map(|(signal, _)| signal.clone())
            .collect())
    }

    fn update_signal_aspect(
        &self,
        id: &SignalId,
        aspect: Aspect,
        _actor: &OperatorId,
    ) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        Self::guard_connected(&inner)?;

        inner.aspect_writes.push((id.clone(), aspect));

        if inner.stuck_signals.contains(id) {
            return Ok(true);
        }

        match inner.signals.get_mut(id) {
            Some(signal) => {
                signal.current_aspect = aspect;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn is_connected(&self) -> bool {
        self.lock().connected
    }
}
