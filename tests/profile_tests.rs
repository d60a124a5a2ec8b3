use cangate::profile::{
    HardwareRevision, SafetyModel, SafetyProfile, FLAG_EXTERNAL_INTERPOSER, FLAG_HW1, FLAG_HW2,
    FLAG_HW3,
};
use cangate::signals::{
    ADDR_EAC_MONITOR, ADDR_LONG_COMMAND_HW1, ADDR_LONG_COMMAND_HW23, ADDR_PEDAL_HW1,
    ADDR_PEDAL_HW23, ADDR_STEERING_COMMAND,
};
use cangate::SafetyGateway;

#[test]
fn test_unknown_selectors_fail_closed() {
    let unknown = [
        SafetyProfile::select(SafetyModel::Silent, 0),
        SafetyProfile::select(SafetyModel::LegacyAngle, 0),
        SafetyProfile::select(SafetyModel::LegacyAngle, FLAG_HW1 | FLAG_HW2),
        SafetyProfile::select(SafetyModel::LegacyAngle, FLAG_HW1 | FLAG_EXTERNAL_INTERPOSER),
        SafetyProfile::select(SafetyModel::LegacyAngle, FLAG_EXTERNAL_INTERPOSER),
    ];
    for profile in &unknown {
        assert!(profile.is_silent());
        assert!(profile.tx_whitelist().is_empty());
    }
}

#[test]
fn test_silent_profile_keeps_controls_unreachable() {
    let mut gateway = SafetyGateway::new(SafetyModel::LegacyAngle, 0);
    assert!(!gateway.set_controls_allowed(true));
    assert!(!gateway.controls_allowed());
}

#[test]
fn test_try_new_surfaces_unknown_selector() {
    assert!(SafetyGateway::try_new(SafetyModel::LegacyAngle, FLAG_HW1 | FLAG_HW2).is_err());
    assert!(SafetyGateway::try_new(SafetyModel::LegacyAngle, FLAG_HW3).is_ok());
    // Explicitly requesting silence is not an error.
    assert!(SafetyGateway::try_new(SafetyModel::Silent, 0).is_ok());
}

#[test]
fn test_hw1_profile() {
    let p = SafetyProfile::select(SafetyModel::LegacyAngle, FLAG_HW1);
    assert_eq!(p.hardware, Some(HardwareRevision::Hw1));
    assert!(p.longitudinal_enabled);
    assert!(!p.uses_eac_monitor);
    assert!(!p.external_interposer);
    assert_eq!(p.buses.chassis, 0);
    assert_eq!(p.long_command_addr, ADDR_LONG_COMMAND_HW1);
    assert_eq!(p.pedal_addr, ADDR_PEDAL_HW1);
    assert!(p.tx_allowed(ADDR_STEERING_COMMAND, 0));
    assert!(p.tx_allowed(ADDR_LONG_COMMAND_HW1, 0));
    assert!(!p.tx_allowed(ADDR_EAC_MONITOR, 0));
    assert_eq!(p.relay_expected_bus(ADDR_STEERING_COMMAND), Some(2));
}

#[test]
fn test_hw2_profile() {
    let p = SafetyProfile::select(SafetyModel::LegacyAngle, FLAG_HW2);
    assert_eq!(p.hardware, Some(HardwareRevision::Hw2));
    assert!(!p.longitudinal_enabled);
    assert!(p.uses_eac_monitor);
    assert_eq!(p.buses.chassis, 0);
    assert_eq!(p.pedal_addr, ADDR_PEDAL_HW23);
    assert!(p.tx_allowed(ADDR_STEERING_COMMAND, 0));
    assert!(p.tx_allowed(ADDR_EAC_MONITOR, 0));
    assert!(!p.tx_allowed(ADDR_LONG_COMMAND_HW23, 0));
    assert_eq!(p.relay_expected_bus(ADDR_EAC_MONITOR), Some(2));
}

#[test]
fn test_hw3_profile_moves_chassis_signals() {
    let p = SafetyProfile::select(SafetyModel::LegacyAngle, FLAG_HW3);
    assert_eq!(p.hardware, Some(HardwareRevision::Hw3));
    assert_eq!(p.buses.chassis, 1);
    assert_eq!(p.buses.pt, 0);
    assert_eq!(p.buses.cam, 2);
}

#[test]
fn test_external_interposer_profiles() {
    for hw in [FLAG_HW2, FLAG_HW3] {
        let p = SafetyProfile::select(SafetyModel::LegacyAngle, hw | FLAG_EXTERNAL_INTERPOSER);
        assert!(p.external_interposer);
        assert!(p.longitudinal_enabled);
        assert!(!p.uses_eac_monitor);
        // Interposer installs read chassis signals from the main bus.
        assert_eq!(p.buses.chassis, 0);
        // Longitudinal command only; no steering authority.
        assert_eq!(p.tx_whitelist(), &[(ADDR_LONG_COMMAND_HW23, 0)]);
        assert_eq!(p.relay_expected_bus(ADDR_LONG_COMMAND_HW23), Some(2));
        assert_eq!(p.relay_expected_bus(ADDR_STEERING_COMMAND), None);
    }
}
