//! TX validator.
//!
//! Top-level admit/reject decision for candidate command frames. Every
//! check degrades to "deny control", never to "command anyway"; a rejected
//! candidate corrupts no state and the caller may submit a corrected one
//! next cycle.

use serde::Serialize;
use tracing::debug;

use crate::dynamics::angle_to_wire;
use crate::frame::CanFrame;
use crate::profile::SafetyProfile;
use crate::signals::{self, SteeringControlType, ACCEL_RAW_ZERO, ADDR_STEERING_COMMAND};
use crate::state::ControlState;

/// Commanded acceleration bounds in raw wire counts: [-3.48, 2.0] m/s^2.
pub const ACCEL_RAW_MIN: u16 = 288;
pub const ACCEL_RAW_MAX: u16 = 425;

/// Applied to the low speed sample before computing angle limits, m/s.
/// Keeps measurement jitter from rejecting a command computed against a
/// marginally different speed than the one the planner saw.
pub const SPEED_FUDGE_MS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    NotWhitelisted,
    MalformedPayload,
    InvalidControlType,
    ControlsNotAllowed,
    AngleLimitExceeded,
    AngleDeltaExceeded,
    StockLkasActive,
    StockAebActive,
    ReverseAccel,
    AebNotAllowed,
    AccelLimitExceeded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TxDecision {
    Admit,
    Reject(RejectReason),
}

impl TxDecision {
    pub fn admitted(&self) -> bool {
        matches!(self, TxDecision::Admit)
    }
}

/// Validate one candidate TX frame and record its command values on admit.
pub fn admit(profile: &SafetyProfile, state: &mut ControlState, frame: &CanFrame) -> TxDecision {
    if !profile.tx_allowed(frame.addr, frame.bus) {
        return TxDecision::Reject(RejectReason::NotWhitelisted);
    }

    let decision = if frame.addr == ADDR_STEERING_COMMAND {
        admit_steering(profile, state, frame)
    } else if frame.addr == profile.long_command_addr {
        admit_longitudinal(state, frame)
    } else {
        // Remaining whitelisted addresses (EAC monitor keep-alive) carry no
        // actuation values to bound.
        TxDecision::Admit
    };

    if let TxDecision::Reject(reason) = decision {
        debug!(addr = frame.addr, ?reason, "TX candidate rejected");
    }
    decision
}

fn admit_steering(
    profile: &SafetyProfile,
    state: &mut ControlState,
    frame: &CanFrame,
) -> TxDecision {
    let Some(cmd) = signals::decode_steering_command(frame) else {
        return TxDecision::Reject(RejectReason::MalformedPayload);
    };

    // Only the two legitimate command types exist for the autonomy stack;
    // anything else is rejected outright, enabled or not.
    match cmd.control_type {
        SteeringControlType::None | SteeringControlType::AngleControl => {}
        _ => return TxDecision::Reject(RejectReason::InvalidControlType),
    }

    if state.stock_lkas_active {
        return TxDecision::Reject(RejectReason::StockLkasActive);
    }

    if cmd.control_type == SteeringControlType::AngleControl {
        if !state.controls_allowed {
            return TxDecision::Reject(RejectReason::ControlsNotAllowed);
        }

        let limit_speed = (f64::from(state.speed_min()) - SPEED_FUDGE_MS).max(0.0);
        let max_angle_wire = angle_to_wire(profile.vehicle.max_angle_deg(limit_speed));
        if cmd.angle_wire.abs() > max_angle_wire {
            return TxDecision::Reject(RejectReason::AngleLimitExceeded);
        }

        if let Some(prev) = state.desired_angle_last {
            let max_delta_wire = angle_to_wire(profile.vehicle.max_angle_delta_deg(limit_speed));
            if (cmd.angle_wire - prev).abs() > max_delta_wire {
                return TxDecision::Reject(RejectReason::AngleDeltaExceeded);
            }
        }
    }

    // Recorded regardless of controls_allowed so the delta limit stays
    // meaningful across a disable/enable cycle.
    state.desired_angle_last = Some(cmd.angle_wire);
    TxDecision::Admit
}

fn admit_longitudinal(state: &mut ControlState, frame: &CanFrame) -> TxDecision {
    let Some(cmd) = signals::decode_long_command(frame) else {
        return TxDecision::Reject(RejectReason::MalformedPayload);
    };

    if state.stock_aeb_active {
        return TxDecision::Reject(RejectReason::StockAebActive);
    }

    // The autonomy stack never originates an AEB event through this path;
    // it may only pass through what the stock system already sent.
    if cmd.aeb_event != 0 {
        return TxDecision::Reject(RejectReason::AebNotAllowed);
    }

    // A strictly negative pair can only produce net reverse acceleration.
    // Compared in raw counts: zero is exact on the wire.
    if cmd.accel_min_raw < ACCEL_RAW_ZERO && cmd.accel_max_raw < ACCEL_RAW_ZERO {
        return TxDecision::Reject(RejectReason::ReverseAccel);
    }

    let inactive = cmd.accel_min_raw == ACCEL_RAW_ZERO && cmd.accel_max_raw == ACCEL_RAW_ZERO;
    if !state.controls_allowed && !inactive {
        return TxDecision::Reject(RejectReason::ControlsNotAllowed);
    }

    let in_range = |raw: u16| (ACCEL_RAW_MIN..=ACCEL_RAW_MAX).contains(&raw);
    if !in_range(cmd.accel_min_raw) || !in_range(cmd.accel_max_raw) {
        return TxDecision::Reject(RejectReason::AccelLimitExceeded);
    }

    state.desired_accel_last = (cmd.accel_min(), cmd.accel_max());
    TxDecision::Admit
}
