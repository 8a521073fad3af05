//! Pulse generator wire protocol
//!
//! Protocol Overview:
//! - Format: `{Opcode}[{arg},{arg},...]` (ASCII, one command per line)
//! - Opcodes: `d` add pulse, `s` link secondary, `b` begin, `e` end,
//!   `A` query active, `R` reset
//! - Durations: every millisecond value travels as two integer fields,
//!   whole seconds then the remaining milliseconds
//! - Replies: one JSON array per line, `[status, values...]`; status 0 means
//!   the command was accepted
//!
//! Commands are built as [`Command`] values and rendered with `Display`;
//! replies are decoded once into [`Response`] and, for `A`, into
//! [`ActivityReport`].

use crate::error::{LightError, LightResult};
use crate::pulse::PulseParams;
use serde_json::Value;
use std::fmt;

/// Split a millisecond count into `(seconds, milliseconds)` wire fields.
pub fn split_millis(total_ms: u64) -> (u64, u64) {
    (total_ms / 1000, total_ms % 1000)
}

/// Inverse of [`split_millis`].
pub fn join_millis(seconds: u64, millis: u64) -> u64 {
    seconds * 1000 + millis
}

/// A single command understood by the pulse generator firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Register one pulse definition.
    AddPulse {
        pin: u8,
        offset_ms: u64,
        duration_ms: u64,
        period_ms: u64,
        analog_value: u8,
    },
    /// Gate the secondary pin's pulse on the primary's.
    SetSecondary { primary_pin: u8, secondary_pin: u8 },
    /// Start the experiment; zero duration runs until stopped.
    Begin { duration_ms: u64 },
    /// Stop the experiment.
    End,
    /// Ask whether an experiment is running.
    QueryActive,
    /// Clear every pulse and link.
    Reset,
}

impl Command {
    /// Build the add-pulse command for a parameter record.
    ///
    /// The record's trigger mode is not part of this command; links are sent
    /// separately with [`Command::SetSecondary`].
    pub fn add_pulse(params: &PulseParams) -> Self {
        Command::AddPulse {
            pin: params.pin,
            offset_ms: params.offset_ms,
            duration_ms: params.duration_ms,
            period_ms: params.period_ms,
            analog_value: params.analog_value,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Command::AddPulse {
                pin,
                offset_ms,
                duration_ms,
                period_ms,
                analog_value,
            } => {
                let (offset_s, offset_ms) = split_millis(offset_ms);
                let (duration_s, duration_ms) = split_millis(duration_ms);
                let (period_s, period_ms) = split_millis(period_ms);
                write!(
                    f,
                    "d[{},{},{},{},{},{},{},{}]",
                    pin,
                    offset_s,
                    offset_ms,
                    duration_s,
                    duration_ms,
                    period_s,
                    period_ms,
                    analog_value
                )
            }
            Command::SetSecondary {
                primary_pin,
                secondary_pin,
            } => write!(f, "s[{},{}]", primary_pin, secondary_pin),
            Command::Begin { duration_ms } => {
                let (sec, ms) = split_millis(duration_ms);
                write!(f, "b[{},{}]", sec, ms)
            }
            Command::End => f.write_str("e"),
            Command::QueryActive => f.write_str("A"),
            Command::Reset => f.write_str("R"),
        }
    }
}

/// A decoded device reply: status code followed by any returned values.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Raw line as received, trimmed.
    pub raw: String,
    /// Every element of the reply array, status included.
    pub fields: Vec<Value>,
}

impl Response {
    /// Parse one reply line.
    ///
    /// Fails with [`LightError::MalformedResponse`] when the line is not a
    /// non-empty JSON array with an integer status, and with
    /// [`LightError::Device`] when the status is non-zero.
    pub fn parse(line: &str) -> LightResult<Self> {
        let raw = line.trim().to_string();
        let value: Value =
            serde_json::from_str(&raw).map_err(|e| LightError::MalformedResponse {
                response: raw.clone(),
                reason: e.to_string(),
            })?;

        let fields = match value {
            Value::Array(fields) if !fields.is_empty() => fields,
            _ => {
                return Err(LightError::MalformedResponse {
                    response: raw,
                    reason: "expected a non-empty array".to_string(),
                })
            }
        };

        let code = fields[0]
            .as_i64()
            .ok_or_else(|| LightError::MalformedResponse {
                response: raw.clone(),
                reason: format!("status '{}' is not an integer", fields[0]),
            })?;

        if code != 0 {
            let message = match fields.get(1) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            };
            return Err(LightError::Device { code, message });
        }

        Ok(Self { raw, fields })
    }

    /// Status code of the reply. Always 0 for a successfully parsed reply.
    pub fn status(&self) -> i64 {
        self.fields[0].as_i64().unwrap_or_default()
    }

    /// Field at `index`, or [`LightError::MissingField`] for a short reply.
    pub fn field(&self, index: usize) -> LightResult<&Value> {
        self.fields.get(index).ok_or_else(|| LightError::MissingField {
            index,
            response: self.raw.clone(),
        })
    }
}

/// Reply to [`Command::QueryActive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityReport {
    /// True while an experiment is running.
    pub active: bool,
}

impl TryFrom<&Response> for ActivityReport {
    type Error = LightError;

    /// The flag is the second field; zero is inactive, anything else active.
    fn try_from(response: &Response) -> LightResult<Self> {
        let flag = response.field(1)?;
        let active = match flag {
            Value::Number(n) => match n.as_i64() {
                Some(v) => v != 0,
                None => n.as_f64().map(|v| v != 0.0).unwrap_or(true),
            },
            Value::Bool(b) => *b,
            other => {
                return Err(LightError::MalformedResponse {
                    response: response.raw.clone(),
                    reason: format!("activity flag '{}' is not numeric", other),
                })
            }
        };
        Ok(Self { active })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_millis() {
        assert_eq!(split_millis(0), (0, 0));
        assert_eq!(split_millis(500), (0, 500));
        assert_eq!(split_millis(30_000), (30, 0));
        assert_eq!(split_millis(12_345), (12, 345));
    }

    #[test]
    fn test_split_join_law() {
        for d in [0, 1, 999, 1000, 1001, 59_999, 86_400_000, u64::MAX / 1000] {
            let (s, ms) = split_millis(d);
            assert!(ms < 1000);
            assert_eq!(join_millis(s, ms), d);
        }
    }

    #[test]
    fn test_add_pulse_encoding() {
        let cmd = Command::AddPulse {
            pin: 3,
            offset_ms: 500,
            duration_ms: 2000,
            period_ms: 5000,
            analog_value: 255,
        };
        assert_eq!(cmd.to_string(), "d[3,0,500,2,0,5,0,255]");
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(
            Command::SetSecondary {
                primary_pin: 11,
                secondary_pin: 3
            }
            .to_string(),
            "s[11,3]"
        );
        assert_eq!(Command::Begin { duration_ms: 30_000 }.to_string(), "b[30,0]");
        assert_eq!(Command::Begin { duration_ms: 0 }.to_string(), "b[0,0]");
        assert_eq!(Command::Begin { duration_ms: 1_250 }.to_string(), "b[1,250]");
        assert_eq!(Command::End.to_string(), "e");
        assert_eq!(Command::QueryActive.to_string(), "A");
        assert_eq!(Command::Reset.to_string(), "R");
    }

    #[test]
    fn test_parse_ok_response() {
        let resp = Response::parse("[0,1]\r\n").unwrap();
        assert_eq!(resp.status(), 0);
        assert_eq!(resp.raw, "[0,1]");
        assert_eq!(resp.fields.len(), 2);
    }

    #[test]
    fn test_parse_device_rejection() {
        let err = Response::parse("[2,\"bad pin\"]").unwrap_err();
        match err {
            LightError::Device { code, message } => {
                assert_eq!(code, 2);
                assert_eq!(message, "bad pin");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            Response::parse("OK"),
            Err(LightError::MalformedResponse { .. })
        ));
        assert!(matches!(
            Response::parse("[]"),
            Err(LightError::MalformedResponse { .. })
        ));
        assert!(matches!(
            Response::parse("[\"x\"]"),
            Err(LightError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_activity_report() {
        let active = |line: &str| {
            ActivityReport::try_from(&Response::parse(line).unwrap()).map(|r| r.active)
        };
        assert!(!active("[0,0]").unwrap());
        assert!(active("[0,1]").unwrap());
        assert!(active("[0,-1]").unwrap());
        assert!(active("[0,2.5]").unwrap());
        assert!(matches!(
            active("[0]"),
            Err(LightError::MissingField { index: 1, .. })
        ));
    }
}
