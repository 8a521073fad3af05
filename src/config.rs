//! Configuration using Figment
//!
//! Settings are loaded from (in order of precedence, lowest first):
//! 1. Built-in defaults
//! 2. An optional TOML file
//! 3. Environment variables prefixed with `PULSE_LIGHT_`, with nested keys
//!    separated by a double underscore
//!
//! ```text
//! PULSE_LIGHT_SERIAL__PORT=/dev/ttyUSB1
//! PULSE_LIGHT_SERIAL__DEBUG=true
//! PULSE_LIGHT_CONTROLLER__POLL_INTERVAL_MS=250
//! ```
//!
//! # Example file
//!
//! ```toml
//! [serial]
//! port = "/dev/ttyACM0"
//! baud_rate = 115200
//!
//! [experiment]
//! duration_ms = 30000
//! wait = true
//!
//! [[experiment.pulses]]
//! name = "blue"
//! pin = 3
//! offset_ms = 500
//! period_ms = 5000
//! duration_ms = 2000
//! trigger = "secondary"
//!
//! [[experiment.pulses]]
//! name = "purple"
//! pin = 11
//! period_ms = 5000
//! duration_ms = 2000
//!
//! [[experiment.links]]
//! primary = "purple"
//! secondary = "blue"
//! ```

use crate::error::{LightError, LightResult};
use crate::pulse::PulseParams;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "PULSE_LIGHT_";

/// Serial port the controller opens when nothing else is configured.
#[cfg(windows)]
pub const DEFAULT_PORT: &str = "COM5";
/// Serial port the controller opens when nothing else is configured.
#[cfg(not(windows))]
pub const DEFAULT_PORT: &str = "/dev/ttyACM0";

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Serial link to the pulse generator.
    #[serde(default)]
    pub serial: SerialSettings,
    /// Controller behaviour.
    #[serde(default)]
    pub controller: ControllerSettings,
    /// Experiment to run; the built-in demonstration when absent.
    #[serde(default)]
    pub experiment: Option<ExperimentPlan>,
}

/// Serial link settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    /// Port path (e.g., "/dev/ttyACM0", "COM5")
    pub port: String,
    /// Communication speed
    pub baud_rate: u32,
    /// Reply deadline per command
    pub timeout_ms: u64,
    /// Appended to every command
    pub line_terminator: String,
    /// Character ending each reply line
    pub response_delimiter: char,
    /// Pause after opening the port while the board reboots
    pub startup_delay_ms: u64,
    /// Log every exchanged line
    pub debug: bool,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: 115_200,
            timeout_ms: 1_000,
            line_terminator: "\r\n".to_string(),
            response_delimiter: '\n',
            startup_delay_ms: 2_000,
            debug: false,
        }
    }
}

/// Controller behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    /// Interval between activity polls while waiting
    pub poll_interval_ms: u64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
        }
    }
}

/// A pulse with a name that links can refer to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPulse {
    /// Identifier used by [`SecondaryLink`]
    pub name: String,
    /// Pulse definition
    #[serde(flatten)]
    pub params: PulseParams,
}

/// Secondary relationship between two named pulses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryLink {
    /// Name of the gating pulse
    pub primary: String,
    /// Name of the gated pulse
    pub secondary: String,
}

/// Pulses, links and run length of one experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentPlan {
    /// Pulses registered in order
    #[serde(default)]
    pub pulses: Vec<NamedPulse>,
    /// Links sent after every pulse is registered
    #[serde(default)]
    pub links: Vec<SecondaryLink>,
    /// Total run length; 0 runs until stopped
    #[serde(default)]
    pub duration_ms: u64,
    /// Block until the device reports inactive
    #[serde(default)]
    pub wait: bool,
}

impl ExperimentPlan {
    /// Look up a pulse by name.
    pub fn pulse(&self, name: &str) -> Option<&PulseParams> {
        self.pulses
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.params)
    }

    /// The two-LED demonstration: blue on pin 3 gated by purple on pin 11,
    /// both 2 s on every 5 s, running for 30 s.
    pub fn demo() -> Self {
        Self {
            pulses: vec![
                NamedPulse {
                    name: "blue".to_string(),
                    params: PulseParams::new(3, 5_000, 2_000)
                        .with_offset(500)
                        .as_secondary(),
                },
                NamedPulse {
                    name: "purple".to_string(),
                    params: PulseParams::new(11, 5_000, 2_000),
                },
            ],
            links: vec![SecondaryLink {
                primary: "purple".to_string(),
                secondary: "blue".to_string(),
            }],
            duration_ms: 30_000,
            wait: false,
        }
    }
}

impl Settings {
    /// Load defaults plus environment overrides.
    pub fn load() -> LightResult<Self> {
        Self::extract(Self::figment())
    }

    /// Load defaults, the TOML file at `path`, then environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`LightError::Config`] if the file cannot be parsed or the
    /// result fails validation.
    pub fn load_from<P: AsRef<Path>>(path: P) -> LightResult<Self> {
        Self::extract(Self::figment().merge(Toml::file(path.as_ref())))
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
    }

    fn extract(figment: Figment) -> LightResult<Self> {
        let settings: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| LightError::Config(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate settings after loading
    ///
    /// Checks:
    /// - Port name is not empty
    /// - Baud rate and poll interval are non-zero
    /// - Pulse names are unique
    /// - Links refer to known pulses
    pub fn validate(&self) -> LightResult<()> {
        if self.serial.port.trim().is_empty() {
            return Err(LightError::Config("serial port cannot be empty".into()));
        }
        if self.serial.baud_rate == 0 {
            return Err(LightError::Config("baud_rate must be non-zero".into()));
        }
        if self.controller.poll_interval_ms == 0 {
            return Err(LightError::Config(
                "poll_interval_ms must be non-zero".into(),
            ));
        }

        if let Some(plan) = &self.experiment {
            let mut names = HashSet::new();
            for pulse in &plan.pulses {
                if !names.insert(pulse.name.as_str()) {
                    return Err(LightError::Config(format!(
                        "Duplicate pulse name: '{}'",
                        pulse.name
                    )));
                }
            }

            for link in &plan.links {
                for name in [&link.primary, &link.secondary] {
                    if !names.contains(name.as_str()) {
                        return Err(LightError::Config(format!(
                            "Link {} -> {} refers to unknown pulse '{}'",
                            link.primary, link.secondary, name
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// The configured experiment, or the demonstration when none is set.
    pub fn experiment_or_demo(&self) -> ExperimentPlan {
        self.experiment.clone().unwrap_or_else(ExperimentPlan::demo)
    }
}
