//! Command encoding and lifecycle tests against the mock transport.

mod common;

use common::{blue, mock_controller, purple, FAST_POLL};
use pulse_light::{LightError, PulseParams, Trigger};
use std::time::{Duration, Instant};
use tracing_test::traced_test;

#[test]
fn add_digital_pulse_encodes_split_durations() {
    let mut leds = mock_controller();
    let params = PulseParams::new(3, 5_000, 2_000).with_offset(500);
    leds.add_digital_pulse(&params).unwrap();
    assert_eq!(leds.transport().sent(), ["d[3,0,500,2,0,5,0,255]"]);
}

#[test]
fn add_digital_pulse_keeps_sub_second_parts() {
    let mut leds = mock_controller();
    let params = PulseParams::new(7, 1_250, 75)
        .with_offset(12_345)
        .with_intensity(0);
    leds.add_digital_pulse(&params).unwrap();
    assert_eq!(leds.transport().sent(), ["d[7,12,345,0,75,1,250,0]"]);
}

#[test]
fn set_secondary_sends_primary_then_secondary() {
    let mut leds = mock_controller();
    leds.set_secondary(&purple(), &blue()).unwrap();
    assert_eq!(leds.transport().sent(), ["s[11,3]"]);
}

#[test]
fn lifecycle_commands() {
    let mut leds = mock_controller();
    leds.start_measurement(30_000).unwrap();
    leds.start_measurement(0).unwrap();
    leds.stop_measurement().unwrap();
    leds.is_active().unwrap();
    leds.reset().unwrap();
    assert_eq!(
        leds.transport().sent(),
        ["b[30,0]", "b[0,0]", "e", "A", "R"]
    );
}

#[test]
fn is_active_reads_second_field() {
    let mut leds = mock_controller();
    leds.transport_mut()
        .push_reply("[0,0]")
        .push_reply("[0,1]")
        .push_reply("[0,-3]")
        .push_reply("[0,255]");

    assert!(!leds.is_active().unwrap());
    assert!(leds.is_active().unwrap());
    assert!(leds.is_active().unwrap());
    assert!(leds.is_active().unwrap());
}

#[test]
fn is_active_short_reply_is_an_error() {
    let mut leds = mock_controller();
    leds.transport_mut().push_reply("[0]");
    let err = leds.is_active().unwrap_err();
    assert!(matches!(err, LightError::MissingField { index: 1, .. }));
}

#[test]
fn transport_faults_propagate_unchanged() {
    let mut leds = mock_controller();
    leds.transport_mut().push_error(LightError::Timeout {
        command: "e".to_string(),
        waited: Duration::from_secs(1),
    });
    leds.transport_mut().push_reply("[4,\"busy\"]");

    match leds.stop_measurement().unwrap_err() {
        LightError::Timeout { command, .. } => assert_eq!(command, "e"),
        other => panic!("unexpected error: {other:?}"),
    }
    match leds.reset().unwrap_err() {
        LightError::Device { code, message } => {
            assert_eq!(code, 4);
            assert_eq!(message, "busy");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn wait_returns_on_first_inactive_poll() {
    let mut leds = mock_controller();
    leds.transport_mut().script_active_for(3);

    let start = Instant::now();
    leds.wait().unwrap();

    // Three active polls, one inactive poll, nothing after it
    assert_eq!(leds.transport().sent(), ["A", "A", "A", "A"]);
    assert_eq!(leds.transport().pending(), 0);
    assert!(start.elapsed() >= FAST_POLL * 3);
}

#[test]
fn wait_when_already_inactive_polls_once() {
    let mut leds = mock_controller();
    leds.wait().unwrap();
    assert_eq!(leds.transport().sent(), ["A"]);
}

#[test]
fn wait_propagates_poll_faults() {
    let mut leds = mock_controller();
    leds.transport_mut()
        .push_reply("[0,1]")
        .push_reply("garbage");
    let err = leds.wait().unwrap_err();
    assert!(matches!(err, LightError::MalformedResponse { .. }));
    assert_eq!(leds.transport().sent().len(), 2);
}

#[test]
fn secondary_flag_not_encoded() {
    let mut leds = mock_controller();
    let independent = PulseParams {
        trigger: Trigger::Independent,
        ..blue()
    };
    leds.add_digital_pulse(&blue()).unwrap();
    leds.add_digital_pulse(&independent).unwrap();
    let sent = leds.transport().sent();
    assert_eq!(sent[0], sent[1]);
}

#[test]
#[traced_test]
fn lifecycle_is_logged() {
    let mut leds = mock_controller();
    leds.start_measurement(1_000).unwrap();
    leds.wait().unwrap();
    assert!(logs_contain("Starting measurement"));
    assert!(logs_contain("Measurement finished"));
}
