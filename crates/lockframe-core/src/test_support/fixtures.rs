use lockframe_types::prelude::*;

/// Active signal with the standard main-aspect capability set and no
/// protection configuration; tests override fields as needed.
pub fn signal(id: &str, aspect: Aspect) -> Signal {
    Signal {
        id: SignalId::new(id),
        kind: SignalKind::Home,
        current_aspect: aspect,
        possible_aspects: vec![Aspect::Red, Aspect::Yellow, Aspect::Green],
        is_active: true,
        protected_tracks: vec![],
        interlocked_with: vec![],
    }
}

/// Active, clear, unassigned track section.
pub fn track(id: &str) -> TrackSection {
    TrackSection {
        id: TrackId::new(id),
        occupied: false,
        occupied_by: None,
        assigned: false,
        is_active: true,
        protecting_signals: vec![],
        approach_locked_by: None,
        conflicting_tracks: vec![],
        adjacent_tracks: vec![],
    }
}

pub fn occupied_track(id: &str, occupied_by: &str) -> TrackSection {
    TrackSection {
        occupied: true,
        occupied_by: Some(occupied_by.to_string()),
        ..track(id)
    }
}

/// Connected, unlocked machine in Normal position wired to the 1T/2T/3T
/// connection triple.
pub fn machine(id: &str) -> PointMachine {
    PointMachine {
        id: PointMachineId::new(id),
        position: PointPosition::Normal,
        operating_status: OperatingStatus::Connected,
        is_active: true,
        is_locked: false,
        time_lock_expiry: None,
        detection_locks: vec![],
        protecting_signals: vec![],
        conflicting_machines: vec![],
        connections: TrackConnections {
            root: TrackId::new("1T"),
            normal: TrackId::new("2T"),
            reverse: TrackId::new("3T"),
        },
    }
}
