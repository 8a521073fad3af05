//! Host-side controller for a serial LED pulse generator.
//!
//! The pulse generator is a microcontroller that switches LEDs on timed
//! schedules for light-stimulation experiments. This library encodes pulse
//! definitions into its textual command protocol, sequences the experiment
//! lifecycle, and polls for completion. It is used by the `pulse-light`
//! binary and can be embedded in larger experiment scripts.

pub mod adapters;
pub mod config;
pub mod controller;
pub mod error;
pub mod experiment;
pub mod protocol;
pub mod pulse;

pub use adapters::{MockTransport, SerialTransport, Transport};
pub use controller::LightController;
pub use error::{LightError, LightResult};
pub use pulse::{PulseParams, Trigger};
