//! Forwarding router.
//!
//! The gateway physically sits between the camera/ADAS unit and the
//! powertrain bus, so traffic is mirrored across the two segments. The
//! exception is the set of addresses the autonomy stack itself transmits:
//! a stock frame for one of those functions passes through only while the
//! stock system is actively commanding it, and the TX validator rejects
//! the autonomy stack's competing command for exactly that duration. At
//! any time one commander per function reaches the actuator, never both.

use crate::profile::SafetyProfile;
use crate::signals::ADDR_STEERING_COMMAND;
use crate::state::ControlState;

/// Destination bus for a received frame, or `None` to block it.
pub fn forward(
    profile: &SafetyProfile,
    state: &ControlState,
    bus: u8,
    addr: u16,
) -> Option<u8> {
    if profile.is_silent() || state.relay_malfunction {
        return None;
    }
    if bus == profile.buses.pt {
        return Some(profile.buses.cam);
    }
    if bus == profile.buses.cam {
        if profile.tx_allowed(addr, profile.buses.pt) && !stock_commanding(profile, state, addr) {
            return None;
        }
        return Some(profile.buses.pt);
    }
    None
}

fn stock_commanding(profile: &SafetyProfile, state: &ControlState, addr: u16) -> bool {
    if addr == ADDR_STEERING_COMMAND {
        state.stock_lkas_active
    } else if addr == profile.long_command_addr {
        state.stock_aeb_active
    } else {
        // The EAC monitor keep-alive has no stock counterpart.
        false
    }
}
