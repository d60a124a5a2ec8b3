//! Bit-level layouts for the frames the gateway reads or validates.
//!
//! The gateway consumes already-encoded frames; full per-vehicle decoding
//! lives in the car-state layer. Only the handful of signals the safety
//! decision needs are unpacked here. Encode helpers are provided for the
//! replay harness and the test suite.

use crate::frame::CanFrame;

// Command frames (autonomy stack or stock ADAS).
pub const ADDR_STEERING_COMMAND: u16 = 0x488;
pub const ADDR_EAC_MONITOR: u16 = 0x27D;
pub const ADDR_LONG_COMMAND_HW1: u16 = 0x2B9;
pub const ADDR_LONG_COMMAND_HW23: u16 = 0x2BF;

// Telemetry frames.
pub const ADDR_EPAS_STATUS: u16 = 0x370;
pub const ADDR_VEHICLE_SPEED: u16 = 0x155;
pub const ADDR_BRAKE_STATUS: u16 = 0x118;
pub const ADDR_PEDAL_HW1: u16 = 0x108;
pub const ADDR_PEDAL_HW23: u16 = 0x106;
pub const ADDR_DRIVE_STATE: u16 = 0x368;

/// Steering angle wire resolution: 0.1 deg per count, 15-bit raw field
/// centered on 16384 so zero degrees is exactly representable.
pub const ANGLE_RAW_ZERO: i32 = 16384;

/// Acceleration wire encoding: 0.04 m/s^2 per count, offset -15 m/s^2.
/// Raw 375 is exactly 0 m/s^2; comparisons are done on raw counts so the
/// sign of a commanded accel is never subject to float rounding.
pub const ACCEL_RAW_ZERO: u16 = 375;
pub const ACCEL_SCALE: f32 = 0.04;
pub const ACCEL_OFFSET: f32 = -15.0;

/// Speed wire resolution, km/h per count.
pub const SPEED_SCALE_KPH: f32 = 0.08;

pub const COUNTER_MASK: u8 = 0x0F;

// Drive-inverter cruise state codes.
pub const CRUISE_STATE_OFF: u8 = 0;
pub const CRUISE_STATE_ENABLED: u8 = 2;
pub const CRUISE_STATE_STANDSTILL: u8 = 3;

// Brake status codes.
pub const BRAKE_STATUS_RELEASED: u8 = 1;
pub const BRAKE_STATUS_PRESSED: u8 = 2;

/// Pedal position wire resolution, percent per count.
pub const PEDAL_SCALE_PCT: f32 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteeringControlType {
    None,
    AngleControl,
    LaneKeepAssist,
    EmergencyLaneKeep,
}

impl SteeringControlType {
    pub fn from_raw(raw: u8) -> Self {
        match raw & 0x3 {
            0 => SteeringControlType::None,
            1 => SteeringControlType::AngleControl,
            2 => SteeringControlType::LaneKeepAssist,
            _ => SteeringControlType::EmergencyLaneKeep,
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            SteeringControlType::None => 0,
            SteeringControlType::AngleControl => 1,
            SteeringControlType::LaneKeepAssist => 2,
            SteeringControlType::EmergencyLaneKeep => 3,
        }
    }

    /// Stock lane-keep interventions use the assist types; the autonomy
    /// stack only ever commands `None` or `AngleControl`.
    pub fn is_stock_assist(self) -> bool {
        matches!(
            self,
            SteeringControlType::LaneKeepAssist | SteeringControlType::EmergencyLaneKeep
        )
    }
}

/// Decoded steering command (0x488). Angle kept in signed wire counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SteeringCommand {
    pub angle_wire: i32,
    pub control_type: SteeringControlType,
    pub counter: u8,
}

pub fn decode_steering_command(frame: &CanFrame) -> Option<SteeringCommand> {
    let data = frame.data();
    if data.len() < 4 {
        return None;
    }
    let raw = u16::from_le_bytes([data[0], data[1]]) & 0x7FFF;
    Some(SteeringCommand {
        angle_wire: i32::from(raw) - ANGLE_RAW_ZERO,
        control_type: SteeringControlType::from_raw(data[2]),
        counter: data[3] & COUNTER_MASK,
    })
}

pub fn encode_steering_command(
    angle_wire: i32,
    control_type: SteeringControlType,
    counter: u8,
    bus: u8,
) -> CanFrame {
    let raw = (angle_wire + ANGLE_RAW_ZERO).clamp(0, 0x7FFF) as u16;
    CanFrame {
        addr: ADDR_STEERING_COMMAND,
        bus,
        len: 4,
        payload: [
            (raw & 0xFF) as u8,
            (raw >> 8) as u8,
            control_type.raw(),
            counter & COUNTER_MASK,
            0,
            0,
            0,
            0,
        ],
    }
}

/// Decoded EPAS status (0x370): measured angle, driver hands-on level and
/// the assist-controller status/error pair used for fault detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpasStatus {
    pub angle_wire: i32,
    pub hands_on_level: u8,
    pub eac_status: u8,
    pub eac_error_code: u8,
    pub counter: u8,
}

pub fn decode_epas_status(frame: &CanFrame) -> Option<EpasStatus> {
    let data = frame.data();
    if data.len() < 8 {
        return None;
    }
    let raw = u16::from_le_bytes([data[0], data[1]]) & 0x3FFF;
    Some(EpasStatus {
        angle_wire: i32::from(raw) - 8192,
        hands_on_level: data[2] & 0x3,
        eac_status: (data[2] >> 2) & 0x7,
        eac_error_code: data[3] & 0x0F,
        counter: data[7] & COUNTER_MASK,
    })
}

pub fn encode_epas_status(
    angle_wire: i32,
    hands_on_level: u8,
    eac_status: u8,
    eac_error_code: u8,
    counter: u8,
    bus: u8,
) -> CanFrame {
    let raw = (angle_wire + 8192).clamp(0, 0x3FFF) as u16;
    CanFrame {
        addr: ADDR_EPAS_STATUS,
        bus,
        len: 8,
        payload: [
            (raw & 0xFF) as u8,
            (raw >> 8) as u8,
            (hands_on_level & 0x3) | ((eac_status & 0x7) << 2),
            eac_error_code & 0x0F,
            0,
            0,
            0,
            counter & COUNTER_MASK,
        ],
    }
}

/// Decoded longitudinal command (0x2B9 / 0x2BF). Accel bounds kept as raw
/// counts; `accel_min()` / `accel_max()` convert to m/s^2 for recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongCommand {
    pub acc_state: u8,
    pub aeb_event: u8,
    pub accel_min_raw: u16,
    pub accel_max_raw: u16,
    pub counter: u8,
}

impl LongCommand {
    pub fn accel_min(&self) -> f32 {
        f32::from(self.accel_min_raw) * ACCEL_SCALE + ACCEL_OFFSET
    }

    pub fn accel_max(&self) -> f32 {
        f32::from(self.accel_max_raw) * ACCEL_SCALE + ACCEL_OFFSET
    }
}

pub fn decode_long_command(frame: &CanFrame) -> Option<LongCommand> {
    let data = frame.data();
    if data.len() < 8 {
        return None;
    }
    Some(LongCommand {
        acc_state: data[0] & 0x0F,
        aeb_event: (data[0] >> 4) & 0x3,
        accel_min_raw: u16::from_le_bytes([data[1], data[2]]) & 0x0FFF,
        accel_max_raw: u16::from_le_bytes([data[3], data[4]]) & 0x0FFF,
        counter: data[7] & COUNTER_MASK,
    })
}

pub fn accel_to_raw(accel: f32) -> u16 {
    let raw = ((accel - ACCEL_OFFSET) / ACCEL_SCALE).round();
    raw.clamp(0.0, 4095.0) as u16
}

pub fn encode_long_command(
    acc_state: u8,
    aeb_event: u8,
    accel_min: f32,
    accel_max: f32,
    counter: u8,
    addr: u16,
    bus: u8,
) -> CanFrame {
    let min_raw = accel_to_raw(accel_min);
    let max_raw = accel_to_raw(accel_max);
    CanFrame {
        addr,
        bus,
        len: 8,
        payload: [
            (acc_state & 0x0F) | ((aeb_event & 0x3) << 4),
            (min_raw & 0xFF) as u8,
            (min_raw >> 8) as u8,
            (max_raw & 0xFF) as u8,
            (max_raw >> 8) as u8,
            0,
            0,
            counter & COUNTER_MASK,
        ],
    }
}

/// Decoded vehicle speed (0x155).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleSpeed {
    pub speed_kph: f32,
    pub counter: u8,
}

impl VehicleSpeed {
    pub fn speed_ms(&self) -> f32 {
        self.speed_kph / 3.6
    }
}

pub fn decode_vehicle_speed(frame: &CanFrame) -> Option<VehicleSpeed> {
    let data = frame.data();
    if data.len() < 8 {
        return None;
    }
    let raw = u16::from_le_bytes([data[0], data[1]]) & 0x1FFF;
    Some(VehicleSpeed {
        speed_kph: f32::from(raw) * SPEED_SCALE_KPH,
        counter: data[7] & COUNTER_MASK,
    })
}

pub fn encode_vehicle_speed(speed_ms: f32, counter: u8, bus: u8) -> CanFrame {
    let raw = ((speed_ms * 3.6 / SPEED_SCALE_KPH).round()).clamp(0.0, 8191.0) as u16;
    CanFrame {
        addr: ADDR_VEHICLE_SPEED,
        bus,
        len: 8,
        payload: [
            (raw & 0xFF) as u8,
            (raw >> 8) as u8,
            0,
            0,
            0,
            0,
            0,
            counter & COUNTER_MASK,
        ],
    }
}

pub fn decode_brake_pressed(frame: &CanFrame) -> Option<bool> {
    let data = frame.data();
    if data.is_empty() {
        return None;
    }
    Some(data[0] & 0x3 == BRAKE_STATUS_PRESSED)
}

pub fn encode_brake_status(pressed: bool, bus: u8) -> CanFrame {
    let status = if pressed {
        BRAKE_STATUS_PRESSED
    } else {
        BRAKE_STATUS_RELEASED
    };
    CanFrame {
        addr: ADDR_BRAKE_STATUS,
        bus,
        len: 8,
        payload: [status, 0, 0, 0, 0, 0, 0, 0],
    }
}

pub fn decode_pedal_percent(frame: &CanFrame) -> Option<f32> {
    let data = frame.data();
    if data.len() < 3 {
        return None;
    }
    Some(f32::from(data[2]) * PEDAL_SCALE_PCT)
}

pub fn encode_pedal(percent: f32, addr: u16, bus: u8) -> CanFrame {
    let raw = (percent / PEDAL_SCALE_PCT).round().clamp(0.0, 255.0) as u8;
    CanFrame {
        addr,
        bus,
        len: 8,
        payload: [0, 0, raw, 0, 0, 0, 0, 0],
    }
}

pub fn decode_cruise_state(frame: &CanFrame) -> Option<u8> {
    let data = frame.data();
    if data.len() < 2 {
        return None;
    }
    Some(data[1] & 0x7)
}

pub fn encode_drive_state(cruise_state: u8, bus: u8) -> CanFrame {
    CanFrame {
        addr: ADDR_DRIVE_STATE,
        bus,
        len: 8,
        payload: [0, cruise_state & 0x7, 0, 0, 0, 0, 0, 0],
    }
}

pub fn encode_eac_monitor(bus: u8) -> CanFrame {
    CanFrame {
        addr: ADDR_EAC_MONITOR,
        bus,
        len: 3,
        payload: [0; 8],
    }
}
