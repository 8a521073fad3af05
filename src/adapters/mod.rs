//! Transport implementations
//!
//! The controller talks to the device through the [`Transport`] trait, which
//! owns byte-level delivery, line framing and reply decoding. Two
//! implementations are provided: [`SerialTransport`] for real hardware and
//! [`MockTransport`] for tests and dry runs.

pub mod mock_adapter;
pub mod serial_adapter;

pub use mock_adapter::MockTransport;
pub use serial_adapter::SerialTransport;

use crate::error::LightResult;
use crate::protocol::Response;

/// Request-response link to the pulse generator.
pub trait Transport {
    /// Send one command line and return the decoded reply.
    ///
    /// Faults of any kind (port, timeout, malformed or rejected reply) are
    /// returned as errors; callers propagate them unchanged.
    fn send_command(&mut self, command: &str) -> LightResult<Response>;

    /// Toggle verbose logging of every exchanged line.
    fn set_debug(&mut self, enabled: bool);
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send_command(&mut self, command: &str) -> LightResult<Response> {
        (**self).send_command(command)
    }

    fn set_debug(&mut self, enabled: bool) {
        (**self).set_debug(enabled)
    }
}
