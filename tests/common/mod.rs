//! Common test utilities for pulse_light integration tests

#![allow(dead_code)] // Utilities may not all be used by every test binary

use pulse_light::{LightController, MockTransport, PulseParams};
use std::time::Duration;

/// Poll interval short enough to keep wait tests fast.
pub const FAST_POLL: Duration = Duration::from_millis(2);

/// Controller over a fresh mock transport with a fast poll interval.
pub fn mock_controller() -> LightController<MockTransport> {
    LightController::new(MockTransport::new()).with_poll_interval(FAST_POLL)
}

/// Blue LED from the demonstration: pin 3, 2 s every 5 s after 500 ms.
pub fn blue() -> PulseParams {
    PulseParams::new(3, 5_000, 2_000)
        .with_offset(500)
        .as_secondary()
}

/// Purple LED from the demonstration: pin 11, 2 s every 5 s.
pub fn purple() -> PulseParams {
    PulseParams::new(11, 5_000, 2_000)
}
