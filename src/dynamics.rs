//! Vehicle dynamics limit model.
//!
//! Pure functions of speed giving the maximum allowed steering angle and the
//! maximum allowed per-cycle angle change, derived from fixed lateral
//! acceleration and jerk bounds and the vehicle geometry. The computed
//! limits are quantized to the steering command's wire resolution so that a
//! command sitting exactly on the bound compares equal instead of failing on
//! float truncation.

use serde::{Deserialize, Serialize};

/// Lateral acceleration bound, m/s^2. Part of the safety contract; do not
/// re-derive.
pub const MAX_LATERAL_ACCEL: f64 = 3.0;

/// Lateral jerk bound, m/s^3.
pub const MAX_LATERAL_JERK: f64 = 5.0;

/// Steering command rate, Hz. One control cycle is 1/50 s.
pub const CONTROL_FREQUENCY_HZ: f64 = 50.0;

/// Speeds below this are clamped up before computing limits; the angle
/// limit is unbounded as speed approaches zero.
pub const MIN_LIMIT_SPEED_MS: f64 = 1.0;

/// Absolute ceiling on the commanded steering-wheel angle, degrees.
pub const STEER_ANGLE_MAX_DEG: f64 = 360.0;

/// Wire counts per degree of steering angle.
pub const DEG_TO_WIRE: f64 = 10.0;

/// Sign-matched bias applied before rounding a limit to wire counts, so a
/// boundary value that lands on x.49999_ due to float error still rounds to
/// the representable count the encoder produced.
const QUANT_EPS: f64 = 1e-5;

/// Geometry of the steered vehicle, fixed per hardware profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleModel {
    pub wheelbase_m: f64,
    pub steer_ratio: f64,
    /// Understeer coefficient, s^2/m^2: scales the kinematic steer angle by
    /// (1 + k * v^2) to account for tire slip at speed.
    pub understeer_coeff: f64,
}

impl VehicleModel {
    pub const MODEL_S: VehicleModel = VehicleModel {
        wheelbase_m: 2.959,
        steer_ratio: 15.0,
        understeer_coeff: 0.0015,
    };

    /// Steering-wheel angle (degrees) producing `curvature` at `speed_ms`.
    fn wheel_angle_deg(&self, curvature: f64, speed_ms: f64) -> f64 {
        let road_wheel_rad =
            curvature * self.wheelbase_m * (1.0 + self.understeer_coeff * speed_ms * speed_ms);
        road_wheel_rad.to_degrees() * self.steer_ratio
    }

    /// Largest steering-wheel angle that keeps lateral acceleration within
    /// [`MAX_LATERAL_ACCEL`] at the given speed, capped at
    /// [`STEER_ANGLE_MAX_DEG`]. Monotonically non-increasing in speed.
    pub fn max_angle_deg(&self, speed_ms: f64) -> f64 {
        let v = speed_ms.max(MIN_LIMIT_SPEED_MS);
        let max_curvature = MAX_LATERAL_ACCEL / (v * v);
        self.wheel_angle_deg(max_curvature, v).min(STEER_ANGLE_MAX_DEG)
    }

    /// Largest per-cycle steering-wheel angle change that keeps lateral jerk
    /// within [`MAX_LATERAL_JERK`] at the given speed.
    pub fn max_angle_delta_deg(&self, speed_ms: f64) -> f64 {
        let v = speed_ms.max(MIN_LIMIT_SPEED_MS);
        let max_curvature_rate = MAX_LATERAL_JERK / (v * v);
        self.wheel_angle_deg(max_curvature_rate / CONTROL_FREQUENCY_HZ, v)
    }
}

/// Round half away from zero.
fn away_round(x: f64) -> f64 {
    if x >= 0.0 {
        (x + 0.5).floor()
    } else {
        (x - 0.5).ceil()
    }
}

/// Quantize an angle in degrees to signed wire counts. Rounds half away
/// from zero with a sign-matched epsilon bias; the bound will be compared
/// against integer wire values, so this rounding policy decides whether a
/// command exactly at the limit is admitted. Tests assert exact boundary
/// equality through this path.
pub fn angle_to_wire(angle_deg: f64) -> i32 {
    let bias = if angle_deg >= 0.0 { QUANT_EPS } else { -QUANT_EPS };
    away_round(angle_deg * DEG_TO_WIRE + bias) as i32
}

/// Wire counts back to degrees.
pub fn wire_to_angle(wire: i32) -> f64 {
    f64::from(wire) / DEG_TO_WIRE
}
