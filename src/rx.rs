//! RX state updater.
//!
//! Dispatches each received frame by address and bus, updating the shared
//! control state and feeding the fault detector. Updates may only revoke
//! `controls_allowed`, never grant it. Unknown addresses on known buses
//! are ignored, not rejected.

use tracing::{debug, warn};

use crate::fault::FaultDetector;
use crate::frame::CanFrame;
use crate::profile::SafetyProfile;
use crate::signals::{
    self, ADDR_BRAKE_STATUS, ADDR_DRIVE_STATE, ADDR_EPAS_STATUS, ADDR_STEERING_COMMAND,
    ADDR_VEHICLE_SPEED, CRUISE_STATE_ENABLED, CRUISE_STATE_STANDSTILL,
};
use crate::state::{ControlState, CounterKind, GAS_PRESSED_PCT};

pub fn handle_frame(
    profile: &SafetyProfile,
    state: &mut ControlState,
    detector: &mut FaultDetector,
    frame: &CanFrame,
) {
    // Relay check runs on every frame, whitelisted or not.
    detector.check_relay(profile, state, frame);

    if frame.bus == profile.buses.chassis {
        match frame.addr {
            ADDR_VEHICLE_SPEED => update_speed(state, detector, frame),
            ADDR_BRAKE_STATUS => update_brake(state, frame),
            ADDR_DRIVE_STATE => update_cruise(state, frame),
            _ => {}
        }
    }

    if frame.bus == profile.buses.pt {
        if frame.addr == profile.pedal_addr {
            update_gas(state, frame);
        } else if frame.addr == ADDR_EPAS_STATUS {
            update_steering_measurement(state, detector, frame);
        }
    }

    if frame.bus == profile.buses.cam {
        if frame.addr == ADDR_STEERING_COMMAND {
            snoop_stock_steering(state, frame);
        } else if frame.addr == profile.long_command_addr {
            snoop_stock_long(state, frame);
        }
    }
}

fn update_speed(state: &mut ControlState, detector: &mut FaultDetector, frame: &CanFrame) {
    let Some(speed) = signals::decode_vehicle_speed(frame) else {
        return;
    };
    detector.check_counter(state, CounterKind::VehicleSpeed, speed.counter, frame);
    state.push_speed_sample(speed.speed_ms());
}

fn update_brake(state: &mut ControlState, frame: &CanFrame) {
    let Some(pressed) = signals::decode_brake_pressed(frame) else {
        return;
    };
    // Rising edge always disengages; a held brake disengages while moving.
    if pressed && (!state.brake_pressed || !state.standstill) && state.controls_allowed {
        warn!("driver brake override: forcing disengage");
        state.revoke_controls();
    }
    state.brake_pressed = pressed;
}

fn update_gas(state: &mut ControlState, frame: &CanFrame) {
    let Some(percent) = signals::decode_pedal_percent(frame) else {
        return;
    };
    let pressed = percent > GAS_PRESSED_PCT;
    if pressed && !state.gas_pressed && state.controls_allowed {
        warn!(percent, "driver gas override: forcing disengage");
        state.revoke_controls();
    }
    state.gas_pressed = pressed;
}

fn update_cruise(state: &mut ControlState, frame: &CanFrame) {
    let Some(code) = signals::decode_cruise_state(frame) else {
        return;
    };
    let engaged = code == CRUISE_STATE_ENABLED || code == CRUISE_STATE_STANDSTILL;
    // Falling edge disengages. The rising edge does not grant controls;
    // enabling is an explicit external request.
    if !engaged && state.cruise_engaged && state.controls_allowed {
        warn!("cruise disengaged by vehicle: forcing disengage");
        state.revoke_controls();
    }
    state.cruise_engaged = engaged;
}

fn update_steering_measurement(
    state: &mut ControlState,
    detector: &mut FaultDetector,
    frame: &CanFrame,
) {
    let Some(epas) = signals::decode_epas_status(frame) else {
        return;
    };
    detector.check_counter(state, CounterKind::EpasStatus, epas.counter, frame);
    detector.note_steering_status(state, &epas);
}

fn snoop_stock_steering(state: &mut ControlState, frame: &CanFrame) {
    let Some(cmd) = signals::decode_steering_command(frame) else {
        return;
    };
    let active = cmd.control_type.is_stock_assist();
    if active != state.stock_lkas_active {
        debug!(active, "stock lane-keep activity changed");
    }
    state.stock_lkas_active = active;
}

fn snoop_stock_long(state: &mut ControlState, frame: &CanFrame) {
    let Some(cmd) = signals::decode_long_command(frame) else {
        return;
    };
    let active = cmd.aeb_event != 0;
    if active != state.stock_aeb_active {
        debug!(active, "stock AEB activity changed");
    }
    state.stock_aeb_active = active;
}
