use cangate::profile::{FLAG_HW1, FLAG_HW2};
use cangate::signals::{
    encode_eac_monitor, encode_long_command, encode_steering_command, ADDR_EAC_MONITOR,
    ADDR_LONG_COMMAND_HW1, ADDR_STEERING_COMMAND, SteeringControlType,
};
use cangate::{SafetyGateway, SafetyModel, TxDecision};

fn gateway() -> SafetyGateway {
    SafetyGateway::new(SafetyModel::LegacyAngle, FLAG_HW2)
}

#[test]
fn test_bulk_traffic_is_mirrored_between_segments() {
    let gw = gateway();
    assert_eq!(gw.fwd_hook(0, 0x123), Some(2));
    assert_eq!(gw.fwd_hook(2, 0x123), Some(0));
    // Only the two bridged segments participate.
    assert_eq!(gw.fwd_hook(1, 0x123), None);
}

#[test]
fn test_stock_lkas_passthrough_excludes_autonomy_command() {
    let mut gw = gateway();
    assert!(gw.set_controls_allowed(true));

    let own_release = encode_steering_command(0, SteeringControlType::None, 0, 0);
    let stock_idle = encode_steering_command(0, SteeringControlType::AngleControl, 0, 2);
    let stock_lkas = encode_steering_command(0, SteeringControlType::LaneKeepAssist, 0, 2);

    // Stock system idle: its frame is not forwarded and our command is
    // admitted.
    gw.rx_hook(&stock_idle);
    assert_eq!(gw.fwd_hook(2, ADDR_STEERING_COMMAND), None);
    assert!(gw.tx_hook(&own_release).admitted());

    // Stock system actively lane-keeping: its frame passes through and our
    // command is rejected, even a release.
    gw.rx_hook(&stock_lkas);
    assert_eq!(gw.fwd_hook(2, ADDR_STEERING_COMMAND), Some(0));
    assert!(!gw.tx_hook(&own_release).admitted());

    // Back to idle: roles flip again.
    gw.rx_hook(&stock_idle);
    assert_eq!(gw.fwd_hook(2, ADDR_STEERING_COMMAND), None);
    assert!(gw.tx_hook(&own_release).admitted());
}

#[test]
fn test_stock_aeb_passthrough_excludes_autonomy_command() {
    let mut gw = SafetyGateway::new(SafetyModel::LegacyAngle, FLAG_HW1);
    assert!(gw.set_controls_allowed(true));

    let own_long = encode_long_command(0, 0, 0.0, 0.0, 0, ADDR_LONG_COMMAND_HW1, 0);
    let stock_no_aeb = encode_long_command(0, 0, 0.0, 0.0, 0, ADDR_LONG_COMMAND_HW1, 2);
    let stock_aeb = encode_long_command(0, 1, -2.0, 0.0, 0, ADDR_LONG_COMMAND_HW1, 2);

    gw.rx_hook(&stock_no_aeb);
    assert_eq!(gw.fwd_hook(2, ADDR_LONG_COMMAND_HW1), None);
    assert!(gw.tx_hook(&own_long).admitted());

    gw.rx_hook(&stock_aeb);
    assert_eq!(gw.fwd_hook(2, ADDR_LONG_COMMAND_HW1), Some(0));
    assert_eq!(
        gw.tx_hook(&own_long),
        TxDecision::Reject(cangate::RejectReason::StockAebActive)
    );

    gw.rx_hook(&stock_no_aeb);
    assert!(gw.tx_hook(&own_long).admitted());
}

#[test]
fn test_eac_monitor_never_forwarded_from_camera() {
    let mut gw = gateway();
    gw.rx_hook(&encode_eac_monitor(2));
    assert_eq!(gw.fwd_hook(2, ADDR_EAC_MONITOR), None);
    // The powertrain side still mirrors outward.
    assert_eq!(gw.fwd_hook(0, ADDR_EAC_MONITOR), Some(2));
}

#[test]
fn test_silent_profile_forwards_nothing() {
    let gw = SafetyGateway::new(SafetyModel::Silent, 0);
    assert_eq!(gw.fwd_hook(0, 0x123), None);
    assert_eq!(gw.fwd_hook(2, 0x123), None);
}
