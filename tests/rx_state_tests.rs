use cangate::profile::{FLAG_HW2, FLAG_HW3};
use cangate::signals::{
    encode_brake_status, encode_drive_state, encode_epas_status, encode_pedal,
    encode_vehicle_speed, ADDR_PEDAL_HW23, CRUISE_STATE_ENABLED, CRUISE_STATE_OFF,
    CRUISE_STATE_STANDSTILL,
};
use cangate::{CanFrame, SafetyGateway, SafetyModel};

fn gateway() -> SafetyGateway {
    SafetyGateway::new(SafetyModel::LegacyAngle, FLAG_HW2)
}

fn feed_speed(gw: &mut SafetyGateway, speed_ms: f32, counter: &mut u8) {
    let chassis = gw.profile().buses.chassis;
    for _ in 0..6 {
        gw.rx_hook(&encode_vehicle_speed(speed_ms, *counter, chassis));
        *counter = (*counter + 1) & 0x0F;
    }
}

#[test]
fn test_speed_updates_and_standstill() {
    let mut gw = gateway();
    let mut cnt = 0;

    feed_speed(&mut gw, 12.0, &mut cnt);
    assert!((gw.state().v_ego - 12.0).abs() < 0.05);
    assert!(!gw.state().standstill);

    feed_speed(&mut gw, 0.0, &mut cnt);
    assert!(gw.state().standstill);
}

#[test]
fn test_speed_sample_window_tracks_min_and_max() {
    let mut gw = gateway();
    let chassis = gw.profile().buses.chassis;
    let mut cnt = 0;
    for speed in [10.0_f32, 11.0, 12.0, 13.0, 14.0, 15.0] {
        gw.rx_hook(&encode_vehicle_speed(speed, cnt, chassis));
        cnt = (cnt + 1) & 0x0F;
    }
    assert!(gw.state().speed_min() < gw.state().speed_max());
    assert!(gw.state().speed_min() < 10.1);
    assert!(gw.state().speed_max() > 14.9);
}

#[test]
fn test_hw3_reads_chassis_signals_from_bus_one() {
    let mut gw = SafetyGateway::new(SafetyModel::LegacyAngle, FLAG_HW3);
    let mut cnt = 0;

    // Frames on the HW3 chassis bus are consumed; the same address on
    // bus 0 is not a chassis signal there and is ignored.
    feed_speed(&mut gw, 8.0, &mut cnt);
    assert!(gw.state().v_ego > 7.9);

    let mut other = gateway();
    other.rx_hook(&encode_vehicle_speed(8.0, 0, 1));
    assert_eq!(other.state().v_ego, 0.0);
}

#[test]
fn test_brake_rising_edge_disengages() {
    let mut gw = gateway();
    let chassis = gw.profile().buses.chassis;
    assert!(gw.set_controls_allowed(true));

    gw.rx_hook(&encode_brake_status(true, chassis));
    assert!(!gw.controls_allowed());
    assert!(gw.state().brake_pressed);

    // Not a held fault: release and re-enable works.
    gw.rx_hook(&encode_brake_status(false, chassis));
    assert!(gw.set_controls_allowed(true));
}

#[test]
fn test_held_brake_disengages_while_moving() {
    let mut gw = gateway();
    let chassis = gw.profile().buses.chassis;
    let mut cnt = 0;
    feed_speed(&mut gw, 10.0, &mut cnt);

    gw.rx_hook(&encode_brake_status(true, chassis));
    assert!(gw.set_controls_allowed(true));

    // Still held while moving: revoked again on the next frame.
    gw.rx_hook(&encode_brake_status(true, chassis));
    assert!(!gw.controls_allowed());
}

#[test]
fn test_gas_threshold_disengages() {
    let mut gw = gateway();
    assert!(gw.set_controls_allowed(true));

    // Below the pressed threshold: no override.
    gw.rx_hook(&encode_pedal(2.0, ADDR_PEDAL_HW23, 0));
    assert!(gw.controls_allowed());
    assert!(!gw.state().gas_pressed);

    gw.rx_hook(&encode_pedal(10.0, ADDR_PEDAL_HW23, 0));
    assert!(!gw.controls_allowed());
    assert!(gw.state().gas_pressed);
}

#[test]
fn test_cruise_falling_edge_disengages() {
    let mut gw = gateway();
    let chassis = gw.profile().buses.chassis;

    gw.rx_hook(&encode_drive_state(CRUISE_STATE_ENABLED, chassis));
    assert!(gw.state().cruise_engaged);
    assert!(gw.set_controls_allowed(true));

    gw.rx_hook(&encode_drive_state(CRUISE_STATE_OFF, chassis));
    assert!(!gw.controls_allowed());
    assert!(!gw.state().cruise_engaged);
}

#[test]
fn test_cruise_rising_edge_does_not_enable() {
    let mut gw = gateway();
    let chassis = gw.profile().buses.chassis;
    gw.rx_hook(&encode_drive_state(CRUISE_STATE_OFF, chassis));
    gw.rx_hook(&encode_drive_state(CRUISE_STATE_STANDSTILL, chassis));
    assert!(gw.state().cruise_engaged);
    // Engagement alone never grants controls; that takes an explicit
    // external enable.
    assert!(!gw.controls_allowed());
}

#[test]
fn test_unknown_address_ignored() {
    let mut gw = gateway();
    assert!(gw.set_controls_allowed(true));
    let frame = CanFrame::new(0x7FF, 0, &[0xFF; 8]).unwrap();
    gw.rx_hook(&frame);
    assert!(gw.controls_allowed());
}

#[test]
fn test_temporary_steering_fault_does_not_disengage() {
    let mut gw = gateway();
    assert!(gw.set_controls_allowed(true));

    // Nonzero, non-disengage-class error code: surfaced but not fatal.
    gw.rx_hook(&encode_epas_status(0, 0, 1, 5, 0, 0));
    assert!(gw.state().steering_fault_temporary);
    assert!(gw.controls_allowed());
    assert!(gw.active_fault().is_none());

    gw.rx_hook(&encode_epas_status(0, 0, 1, 0, 1, 0));
    assert!(!gw.state().steering_fault_temporary);
}

#[test]
fn test_steering_pressed_debounce() {
    let mut gw = gateway();
    let mut cnt = 0u8;
    for _ in 0..2 {
        gw.rx_hook(&encode_epas_status(0, 1, 1, 0, cnt, 0));
        cnt = (cnt + 1) & 0x0F;
    }
    assert!(!gw.state().steering_pressed);

    gw.rx_hook(&encode_epas_status(0, 1, 1, 0, cnt, 0));
    assert!(gw.state().steering_pressed);

    cnt = (cnt + 1) & 0x0F;
    gw.rx_hook(&encode_epas_status(0, 0, 1, 0, cnt, 0));
    assert!(!gw.state().steering_pressed);
}
