//! In-memory transport
//!
//! Records every command and answers from a script, so the controller can be
//! exercised without a device attached. With an empty script the mock behaves
//! like an idle generator: every command is accepted with `[0]` and `A`
//! reports inactive with `[0,0]`.

use crate::adapters::Transport;
use crate::error::{LightError, LightResult};
use crate::protocol::{Command, Response};
use std::collections::VecDeque;
use tracing::debug;

enum Scripted {
    Reply(String),
    Fail(LightError),
}

/// Scripted stand-in for the serial transport.
#[derive(Default)]
pub struct MockTransport {
    sent: Vec<String>,
    script: VecDeque<Scripted>,
    debug: bool,
}

impl MockTransport {
    /// Create a mock that accepts everything and reports inactive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw reply line for the next command.
    pub fn push_reply(&mut self, line: impl Into<String>) -> &mut Self {
        self.script.push_back(Scripted::Reply(line.into()));
        self
    }

    /// Queue a fault for the next command.
    pub fn push_error(&mut self, err: LightError) -> &mut Self {
        self.script.push_back(Scripted::Fail(err));
        self
    }

    /// Queue `polls` active replies followed by one inactive reply.
    pub fn script_active_for(&mut self, polls: usize) -> &mut Self {
        for _ in 0..polls {
            self.push_reply("[0,1]");
        }
        self.push_reply("[0,0]")
    }

    /// Every command sent so far, oldest first.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    /// Number of scripted replies not yet consumed.
    pub fn pending(&self) -> usize {
        self.script.len()
    }

    /// Whether traffic logging is on.
    pub fn debug_enabled(&self) -> bool {
        self.debug
    }

    fn default_reply(command: &str) -> &'static str {
        if command == Command::QueryActive.to_string() {
            "[0,0]"
        } else {
            "[0]"
        }
    }
}

impl Transport for MockTransport {
    fn send_command(&mut self, command: &str) -> LightResult<Response> {
        self.sent.push(command.to_string());

        let reply = match self.script.pop_front() {
            Some(Scripted::Reply(line)) => line,
            Some(Scripted::Fail(err)) => return Err(err),
            None => Self::default_reply(command).to_string(),
        };

        if self.debug {
            debug!("[mock] {} -> {}", command, reply);
        }

        Response::parse(&reply)
    }

    fn set_debug(&mut self, enabled: bool) {
        self.debug = enabled;
    }
}
