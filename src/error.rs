//! Error type for the light controller.
//!
//! Every fault the controller can hit originates in the transport: the serial
//! port, the line framing, or the device rejecting a command. `LightError`
//! collects those sources so the controller can propagate them with `?`
//! without wrapping or translating them.

use std::time::Duration;
use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type LightResult<T> = std::result::Result<T, LightError>;

/// Faults raised while talking to the pulse generator.
#[derive(Error, Debug)]
pub enum LightError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No response to '{command}' after {waited:?}")]
    Timeout { command: String, waited: Duration },

    #[error("Malformed response '{response}': {reason}")]
    MalformedResponse { response: String, reason: String },

    #[error("Response '{response}' has no field at index {index}")]
    MissingField { index: usize, response: String },

    #[error("Device rejected command (status {code}): {message}")]
    Device { code: i64, message: String },

    #[error("Experiment still active after {0:?}")]
    WaitTimeout(Duration),

    #[error("Configuration validation error: {0}")]
    Config(String),
}
