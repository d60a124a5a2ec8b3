//! Safety profile registry.
//!
//! One immutable [`SafetyProfile`] is selected at initialization from a
//! `(SafetyModel, param)` pair and never changes for the session. Unknown
//! selectors fail closed: the silent profile whitelists nothing and keeps
//! `controls_allowed` unreachable.

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::dynamics::VehicleModel;
use crate::signals::{
    ADDR_EAC_MONITOR, ADDR_LONG_COMMAND_HW1, ADDR_LONG_COMMAND_HW23, ADDR_PEDAL_HW1,
    ADDR_PEDAL_HW23, ADDR_STEERING_COMMAND,
};

/// Hardware revision selector bits for [`SafetyModel::LegacyAngle`].
pub const FLAG_HW1: u32 = 1;
pub const FLAG_HW2: u32 = 2;
pub const FLAG_HW3: u32 = 4;
/// The gateway sits behind an external interposer device rather than on the
/// vehicle harness; only longitudinal commands are authorized.
pub const FLAG_EXTERNAL_INTERPOSER: u32 = 8;

const MAX_TX_ENTRIES: usize = 8;
const MAX_RELAY_ENTRIES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafetyModel {
    /// No transmits permitted; the boot/default state.
    Silent,
    /// Angle-control vehicles with the legacy DAS command set.
    LegacyAngle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HardwareRevision {
    Hw1,
    Hw2,
    Hw3,
}

/// Logical bus roles mapped to physical bus indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusMap {
    pub pt: u8,
    pub cam: u8,
    pub adas: u8,
    pub chassis: u8,
    pub radar: u8,
}

impl BusMap {
    const fn with_chassis(chassis: u8) -> Self {
        BusMap {
            pt: 0,
            cam: 2,
            adas: 2,
            chassis,
            radar: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SafetyProfile {
    pub model: SafetyModel,
    pub hardware: Option<HardwareRevision>,
    pub flags: u32,
    pub buses: BusMap,
    pub vehicle: VehicleModel,
    pub longitudinal_enabled: bool,
    pub external_interposer: bool,
    /// HW2/HW3 internal installs transmit the EAC monitor keep-alive.
    pub uses_eac_monitor: bool,
    /// Longitudinal command address for this revision (observed on the
    /// camera bus even when longitudinal TX is not authorized).
    pub long_command_addr: u16,
    pub pedal_addr: u16,
    tx_whitelist: ArrayVec<(u16, u8), MAX_TX_ENTRIES>,
    /// Addresses with exactly one legitimate source bus; sighting one
    /// anywhere else means the isolation relay failed.
    relay_expected: ArrayVec<(u16, u8), MAX_RELAY_ENTRIES>,
}

impl SafetyProfile {
    /// Select a profile. Total: any selector the registry does not know
    /// yields the silent profile rather than an error path that could be
    /// skipped.
    pub fn select(model: SafetyModel, param: u32) -> SafetyProfile {
        match model {
            SafetyModel::Silent => SafetyProfile::silent(),
            SafetyModel::LegacyAngle => SafetyProfile::legacy_angle(param),
        }
    }

    pub fn silent() -> SafetyProfile {
        SafetyProfile {
            model: SafetyModel::Silent,
            hardware: None,
            flags: 0,
            buses: BusMap::with_chassis(0),
            vehicle: VehicleModel::MODEL_S,
            longitudinal_enabled: false,
            external_interposer: false,
            uses_eac_monitor: false,
            long_command_addr: ADDR_LONG_COMMAND_HW23,
            pedal_addr: ADDR_PEDAL_HW23,
            tx_whitelist: ArrayVec::new(),
            relay_expected: ArrayVec::new(),
        }
    }

    fn legacy_angle(param: u32) -> SafetyProfile {
        let external = param & FLAG_EXTERNAL_INTERPOSER != 0;
        let hardware = match param & (FLAG_HW1 | FLAG_HW2 | FLAG_HW3) {
            FLAG_HW1 => HardwareRevision::Hw1,
            FLAG_HW2 => HardwareRevision::Hw2,
            FLAG_HW3 => HardwareRevision::Hw3,
            // Zero or conflicting revision bits: fail closed.
            _ => return SafetyProfile::silent(),
        };
        // No HW1 external interposer hardware exists.
        if external && hardware == HardwareRevision::Hw1 {
            return SafetyProfile::silent();
        }

        let hw1 = hardware == HardwareRevision::Hw1;
        let chassis = if hardware == HardwareRevision::Hw3 && !external {
            1
        } else {
            0
        };
        let buses = BusMap::with_chassis(chassis);
        let long_command_addr = if hw1 {
            ADDR_LONG_COMMAND_HW1
        } else {
            ADDR_LONG_COMMAND_HW23
        };
        let pedal_addr = if hw1 { ADDR_PEDAL_HW1 } else { ADDR_PEDAL_HW23 };
        let uses_eac_monitor = !hw1 && !external;
        let longitudinal_enabled = hw1 || external;

        let mut tx_whitelist: ArrayVec<(u16, u8), MAX_TX_ENTRIES> = ArrayVec::new();
        let mut relay_expected: ArrayVec<(u16, u8), MAX_RELAY_ENTRIES> = ArrayVec::new();
        if external {
            tx_whitelist.push((long_command_addr, buses.pt));
            relay_expected.push((long_command_addr, buses.cam));
        } else {
            tx_whitelist.push((ADDR_STEERING_COMMAND, buses.pt));
            relay_expected.push((ADDR_STEERING_COMMAND, buses.cam));
            if hw1 {
                tx_whitelist.push((long_command_addr, buses.pt));
            } else {
                tx_whitelist.push((ADDR_EAC_MONITOR, buses.pt));
                relay_expected.push((ADDR_EAC_MONITOR, buses.cam));
            }
        }

        SafetyProfile {
            model: SafetyModel::LegacyAngle,
            hardware: Some(hardware),
            flags: param,
            buses,
            vehicle: VehicleModel::MODEL_S,
            longitudinal_enabled,
            external_interposer: external,
            uses_eac_monitor,
            long_command_addr,
            pedal_addr,
            tx_whitelist,
            relay_expected,
        }
    }

    /// The silent profile transmits nothing and can never enable controls.
    pub fn is_silent(&self) -> bool {
        self.tx_whitelist.is_empty()
    }

    pub fn tx_allowed(&self, addr: u16, bus: u8) -> bool {
        self.tx_whitelist.iter().any(|&(a, b)| a == addr && b == bus)
    }

    pub fn tx_whitelist(&self) -> &[(u16, u8)] {
        &self.tx_whitelist
    }

    /// The only bus this address may legitimately appear on, if it is
    /// relay-monitored.
    pub fn relay_expected_bus(&self, addr: u16) -> Option<u8> {
        self.relay_expected
            .iter()
            .find(|&&(a, _)| a == addr)
            .map(|&(_, b)| b)
    }
}
