//! Process-wide control state.
//!
//! Single authoritative instance owned by the gateway. Mutated only by the
//! RX updater and the fault detector; the TX validator reads it. Every
//! mutation is a total function of the current state and one incoming
//! message, so replay of a frame log reproduces decisions exactly.

use heapless::Vec;
use serde::Serialize;

/// Speed samples cross-checked when applying kinematic limits.
pub const SPEED_SAMPLE_WINDOW: usize = 6;

/// Consecutive wrong counter values tolerated before the message stream is
/// declared stale.
pub const MAX_WRONG_COUNTERS: u8 = 5;

/// Below this absolute speed the vehicle is considered stationary, m/s.
pub const STANDSTILL_THRESHOLD_MS: f32 = 0.1;

/// Pedal position above this is a driver gas override, percent.
pub const GAS_PRESSED_PCT: f32 = 3.0;

/// Consecutive hands-on frames before the steering-pressed flag latches.
pub const STEERING_PRESSED_DEBOUNCE: u8 = 3;

/// Counter-checked received message streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    EpasStatus,
    VehicleSpeed,
}

/// Rolling-counter tracker for one message stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterCheck {
    last: Option<u8>,
    wrong_streak: u8,
}

impl CounterCheck {
    /// Feed the counter from a newly received frame. Returns whether the
    /// stream is still within tolerance.
    pub fn observe(&mut self, counter: u8) -> bool {
        if let Some(last) = self.last {
            let expected = (last + 1) & 0x0F;
            if counter == expected {
                self.wrong_streak = 0;
            } else {
                self.wrong_streak = self.wrong_streak.saturating_add(1);
            }
        }
        self.last = Some(counter);
        self.wrong_streak <= MAX_WRONG_COUNTERS
    }

    pub fn faulted(&self) -> bool {
        self.wrong_streak > MAX_WRONG_COUNTERS
    }
}

#[derive(Debug, Clone, Default)]
pub struct ControlState {
    /// The single authoritative flag permitting autonomy commands. Set true
    /// only by an explicit external enable with no fault held; any detector
    /// or override path may clear it.
    pub controls_allowed: bool,

    pub v_ego: f32,
    pub standstill: bool,
    speed_samples: Vec<f32, SPEED_SAMPLE_WINDOW>,

    // Driver overrides.
    pub gas_pressed: bool,
    pub brake_pressed: bool,
    pub steering_pressed: bool,
    pub hands_on_level: u8,
    pub hands_on_frames: u8,

    // Electric assist controller, from the steering measurement frame.
    pub eac_status: u8,
    pub eac_error_code: u8,
    pub steering_fault_temporary: bool,
    pub angle_meas_wire: i32,

    // Last admitted command, wire units; survives disable/enable so the
    // delta limit stays meaningful across a cycle.
    pub desired_angle_last: Option<i32>,
    pub desired_accel_last: (f32, f32),

    pub cruise_engaged: bool,

    // Stock-system activity observed on the camera bus.
    pub stock_lkas_active: bool,
    pub stock_aeb_active: bool,

    // Held fault conditions.
    pub relay_malfunction: bool,
    pub stale_counter_fault: bool,

    pub epas_counter: CounterCheck,
    pub speed_counter: CounterCheck,

    /// Control cycles elapsed, advanced by the external tick.
    pub cycle: u64,
}

impl ControlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full reset on re-initialization (ignition cycle).
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn counter_mut(&mut self, kind: CounterKind) -> &mut CounterCheck {
        match kind {
            CounterKind::EpasStatus => &mut self.epas_counter,
            CounterKind::VehicleSpeed => &mut self.speed_counter,
        }
    }

    pub fn push_speed_sample(&mut self, speed_ms: f32) {
        if self.speed_samples.is_full() {
            self.speed_samples.remove(0);
        }
        let _ = self.speed_samples.push(speed_ms);
        self.v_ego = speed_ms;
        self.standstill = speed_ms.abs() < STANDSTILL_THRESHOLD_MS;
    }

    pub fn speed_min(&self) -> f32 {
        self.speed_samples
            .iter()
            .copied()
            .fold(self.v_ego, f32::min)
    }

    pub fn speed_max(&self) -> f32 {
        self.speed_samples
            .iter()
            .copied()
            .fold(self.v_ego, f32::max)
    }

    /// Revoke permission to drive. Never the inverse; enabling goes through
    /// the gateway's external enable path.
    pub fn revoke_controls(&mut self) {
        self.controls_allowed = false;
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            controls_allowed: self.controls_allowed,
            v_ego: self.v_ego,
            standstill: self.standstill,
            gas_pressed: self.gas_pressed,
            brake_pressed: self.brake_pressed,
            steering_pressed: self.steering_pressed,
            cruise_engaged: self.cruise_engaged,
            stock_lkas_active: self.stock_lkas_active,
            stock_aeb_active: self.stock_aeb_active,
            relay_malfunction: self.relay_malfunction,
            stale_counter_fault: self.stale_counter_fault,
            steering_fault_temporary: self.steering_fault_temporary,
            desired_angle_last: self.desired_angle_last,
            cycle: self.cycle,
        }
    }
}

/// Serializable view of the control state for telemetry and the replay
/// harness.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub controls_allowed: bool,
    pub v_ego: f32,
    pub standstill: bool,
    pub gas_pressed: bool,
    pub brake_pressed: bool,
    pub steering_pressed: bool,
    pub cruise_engaged: bool,
    pub stock_lkas_active: bool,
    pub stock_aeb_active: bool,
    pub relay_malfunction: bool,
    pub stale_counter_fault: bool,
    pub steering_fault_temporary: bool,
    pub desired_angle_last: Option<i32>,
    pub cycle: u64,
}
