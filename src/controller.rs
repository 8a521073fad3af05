//! Light controller
//!
//! Translates pulse definitions and experiment lifecycle requests into
//! protocol commands for the pulse generator.
//!
//! Device lifecycle, as driven from the host:
//!
//! ```text
//! UNCONFIGURED --add_digital_pulse / set_secondary--> CONFIGURED
//! CONFIGURED   --start_measurement------------------> RUNNING
//! RUNNING      --stop_measurement / duration expiry--> STOPPED
//! STOPPED      --reset-------------------------------> UNCONFIGURED
//! ```
//!
//! Every transition is fire-and-forget; the only state the host can observe
//! is [`LightController::is_active`].
//!
//! # Example
//!
//! ```no_run
//! use pulse_light::{config::SerialSettings, LightController, PulseParams, SerialTransport};
//!
//! fn main() -> pulse_light::LightResult<()> {
//!     let transport = SerialTransport::open(&SerialSettings::default())?;
//!     let mut leds = LightController::new(transport);
//!
//!     let blue = PulseParams::new(3, 5_000, 2_000).with_offset(500);
//!     leds.add_digital_pulse(&blue)?;
//!     leds.start_measurement(30_000)?;
//!     leds.wait()?;
//!     Ok(())
//! }
//! ```

use crate::adapters::Transport;
use crate::error::{LightError, LightResult};
use crate::protocol::{ActivityReport, Command, Response};
use crate::pulse::PulseParams;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Interval between activity polls in [`LightController::wait`].
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Host-side handle on one pulse generator.
pub struct LightController<T: Transport> {
    transport: T,
    poll_interval: Duration,
}

impl<T: Transport> LightController<T> {
    /// Wrap a transport, polling every 500 ms while waiting.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Use a different interval between activity polls.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Interval between activity polls.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Borrow the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Borrow the transport mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give the transport back.
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Toggle the transport's traffic logging.
    pub fn set_debug(&mut self, enabled: bool) {
        self.transport.set_debug(enabled);
    }

    fn send(&mut self, command: Command) -> LightResult<Response> {
        self.transport.send_command(&command.to_string())
    }

    /// Register a pulse on the device.
    ///
    /// The pulse's trigger mode is not transmitted; use
    /// [`set_secondary`](Self::set_secondary) to gate it on another pulse.
    pub fn add_digital_pulse(&mut self, params: &PulseParams) -> LightResult<()> {
        debug!(
            "Adding pulse on pin {} (offset {} ms, {} ms every {} ms, value {})",
            params.pin, params.offset_ms, params.duration_ms, params.period_ms, params.analog_value
        );
        self.send(Command::add_pulse(params))?;
        Ok(())
    }

    /// Gate `secondary`'s pulse on `primary`'s.
    ///
    /// Both pulses must already be registered; this is not checked.
    pub fn set_secondary(
        &mut self,
        primary: &PulseParams,
        secondary: &PulseParams,
    ) -> LightResult<()> {
        debug!("Linking pin {} as secondary of pin {}", secondary.pin, primary.pin);
        self.send(Command::SetSecondary {
            primary_pin: primary.pin,
            secondary_pin: secondary.pin,
        })?;
        Ok(())
    }

    /// Start the experiment. A zero duration runs until stopped.
    pub fn start_measurement(&mut self, duration_ms: u64) -> LightResult<()> {
        info!("Starting measurement (duration {} ms)", duration_ms);
        self.send(Command::Begin { duration_ms })?;
        Ok(())
    }

    /// Stop the experiment.
    pub fn stop_measurement(&mut self) -> LightResult<()> {
        info!("Stopping measurement");
        self.send(Command::End)?;
        Ok(())
    }

    /// Ask the device whether an experiment is running.
    pub fn is_active(&mut self) -> LightResult<bool> {
        let response = self.send(Command::QueryActive)?;
        let report = ActivityReport::try_from(&response)?;
        Ok(report.active)
    }

    /// Block until the device reports inactive.
    ///
    /// Polls every [`poll_interval`](Self::poll_interval) with no upper
    /// bound; use [`wait_timeout`](Self::wait_timeout) when the device may
    /// never finish.
    pub fn wait(&mut self) -> LightResult<()> {
        self.wait_until(None)
    }

    /// Like [`wait`](Self::wait), but gives up with
    /// [`LightError::WaitTimeout`] once `limit` has elapsed.
    pub fn wait_timeout(&mut self, limit: Duration) -> LightResult<()> {
        self.wait_until(Some(limit))
    }

    fn wait_until(&mut self, limit: Option<Duration>) -> LightResult<()> {
        let start = Instant::now();
        let mut polls = 0u64;

        loop {
            polls += 1;
            if !self.is_active()? {
                info!("Measurement finished after {} polls", polls);
                return Ok(());
            }

            if let Some(limit) = limit {
                if start.elapsed() + self.poll_interval > limit {
                    return Err(LightError::WaitTimeout(limit));
                }
            }

            std::thread::sleep(self.poll_interval);
        }
    }

    /// Stop any running experiment and erase every pulse and link.
    pub fn reset(&mut self) -> LightResult<()> {
        info!("Resetting pulse generator");
        self.send(Command::Reset)?;
        Ok(())
    }
}
