//! Fault and relay-malfunction detection.
//!
//! All triggers here force `controls_allowed = false` independently of any
//! TX decision, and the conditions are level-triggered: while one holds,
//! an external enable request is refused.

use heapless::Vec;
use serde::Serialize;
use tracing::warn;

use crate::frame::CanFrame;
use crate::profile::SafetyProfile;
use crate::signals::EpasStatus;
use crate::state::{ControlState, CounterKind, STEERING_PRESSED_DEBOUNCE};

/// Hands-on severity at or above this disengages regardless of EAC fields.
pub const HANDS_ON_DISENGAGE_LEVEL: u8 = 3;

/// EAC status code meaning the assist controller is inactive.
pub const EAC_STATUS_INACTIVE: u8 = 0;

/// The one EAC error code that, combined with an inactive status, is a
/// disengage-class event. Other nonzero codes are temporary faults only.
pub const EAC_ERROR_DISENGAGE: u8 = 9;

const MAX_FAULT_RECORDS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FaultKind {
    RelayMalfunction,
    SteeringOverride,
    StaleCounter,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FaultRecord {
    pub kind: FaultKind,
    pub cycle: u64,
    pub addr: u16,
    pub bus: u8,
}

#[derive(Debug, Default)]
pub struct FaultDetector {
    records: Vec<FaultRecord, MAX_FAULT_RECORDS>,
}

impl FaultDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.records.clear();
    }

    pub fn records(&self) -> &[FaultRecord] {
        &self.records
    }

    fn record(&mut self, kind: FaultKind, cycle: u64, addr: u16, bus: u8) {
        if self.records.is_full() {
            self.records.remove(0);
        }
        let _ = self.records.push(FaultRecord {
            kind,
            cycle,
            addr,
            bus,
        });
    }

    /// Relay malfunction check, applied to every received frame before
    /// dispatch. A monitored address sighted off its legitimate bus means
    /// the isolation relay failed to disconnect a segment; detection is
    /// immediate and holds for the rest of the session.
    pub fn check_relay(
        &mut self,
        profile: &SafetyProfile,
        state: &mut ControlState,
        frame: &CanFrame,
    ) {
        if let Some(expected_bus) = profile.relay_expected_bus(frame.addr) {
            if frame.bus != expected_bus && !state.relay_malfunction {
                warn!(
                    addr = frame.addr,
                    bus = frame.bus,
                    expected_bus,
                    "relay malfunction: monitored address on unexpected bus"
                );
                state.relay_malfunction = true;
                state.revoke_controls();
                self.record(FaultKind::RelayMalfunction, state.cycle, frame.addr, frame.bus);
            }
        }
    }

    /// Ingest a steering measurement: driver hands-on escalation, EAC
    /// disengage events and the temporary fault flag.
    pub fn note_steering_status(&mut self, state: &mut ControlState, epas: &EpasStatus) {
        state.hands_on_level = epas.hands_on_level;
        state.eac_status = epas.eac_status;
        state.eac_error_code = epas.eac_error_code;
        state.angle_meas_wire = epas.angle_wire;

        if epas.hands_on_level > 0 {
            state.hands_on_frames = state.hands_on_frames.saturating_add(1);
        } else {
            state.hands_on_frames = 0;
        }
        state.steering_pressed = state.hands_on_frames >= STEERING_PRESSED_DEBOUNCE;

        state.steering_fault_temporary =
            epas.eac_error_code != 0 && epas.eac_error_code != EAC_ERROR_DISENGAGE;

        if steering_disengage_held(state) {
            if state.controls_allowed {
                warn!(
                    hands_on_level = epas.hands_on_level,
                    eac_status = epas.eac_status,
                    eac_error_code = epas.eac_error_code,
                    "steering override: forcing disengage"
                );
                self.record(FaultKind::SteeringOverride, state.cycle, 0, 0);
            }
            state.revoke_controls();
        }
    }

    /// Rolling-counter check for one message stream. Past tolerance the
    /// stream is stale and controls are revoked; the condition clears once
    /// a valid sequence resumes.
    pub fn check_counter(
        &mut self,
        state: &mut ControlState,
        kind: CounterKind,
        counter: u8,
        frame: &CanFrame,
    ) {
        let within_tolerance = state.counter_mut(kind).observe(counter);
        let faulted = state.epas_counter.faulted() || state.speed_counter.faulted();
        if !within_tolerance && state.controls_allowed {
            warn!(
                addr = frame.addr,
                counter, "stale counter stream: forcing disengage"
            );
            self.record(FaultKind::StaleCounter, state.cycle, frame.addr, frame.bus);
        }
        if faulted {
            state.revoke_controls();
        }
        state.stale_counter_fault = faulted;
    }

    /// The fault currently held, if any. While this returns `Some`, an
    /// external enable request is refused.
    pub fn active_fault(&self, state: &ControlState) -> Option<FaultKind> {
        if state.relay_malfunction {
            Some(FaultKind::RelayMalfunction)
        } else if steering_disengage_held(state) {
            Some(FaultKind::SteeringOverride)
        } else if state.stale_counter_fault {
            Some(FaultKind::StaleCounter)
        } else {
            None
        }
    }
}

/// Level condition for the steering disengage: severe hands-on, or the
/// assist controller inactive with the disengage-class error code.
fn steering_disengage_held(state: &ControlState) -> bool {
    state.hands_on_level >= HANDS_ON_DISENGAGE_LEVEL
        || (state.eac_status == EAC_STATUS_INACTIVE
            && state.eac_error_code == EAC_ERROR_DISENGAGE)
}
