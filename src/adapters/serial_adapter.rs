use crate::adapters::Transport;
use crate::config::SerialSettings;
use crate::error::{LightError, LightResult};
use crate::protocol::Response;
use serialport::SerialPort;
use std::io::{Read, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Internal per-read timeout; the overall reply deadline is `timeout`.
const PORT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Serial transport for the pulse generator
///
/// Wraps the serialport crate with blocking, line-oriented request/response
/// exchanges. Opening the port resets most Arduino-class boards, so
/// [`SerialTransport::open`] waits for the configured startup delay before
/// returning.
pub struct SerialTransport {
    /// Port name (e.g., "/dev/ttyACM0", "COM5")
    port_name: String,

    /// Reply deadline per command
    timeout: Duration,

    /// Appended to every command (e.g., "\r\n")
    line_terminator: String,

    /// Byte that ends a reply line
    response_delimiter: u8,

    /// Log every exchanged line at debug level
    debug: bool,

    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Open the port described by `settings`.
    ///
    /// # Errors
    /// Returns [`LightError::Serial`] if the port cannot be opened.
    pub fn open(settings: &SerialSettings) -> LightResult<Self> {
        let port = serialport::new(&settings.port, settings.baud_rate)
            .timeout(PORT_READ_TIMEOUT)
            .open()?;

        info!(
            "Serial port '{}' opened at {} baud",
            settings.port, settings.baud_rate
        );

        let transport = Self::from_port(port, settings);

        if settings.startup_delay_ms > 0 {
            debug!(
                "Waiting {} ms for '{}' to finish booting",
                settings.startup_delay_ms, settings.port
            );
            std::thread::sleep(Duration::from_millis(settings.startup_delay_ms));
        }

        Ok(transport)
    }

    /// Wrap an already opened port.
    pub fn from_port(port: Box<dyn SerialPort>, settings: &SerialSettings) -> Self {
        Self {
            port_name: settings.port.clone(),
            timeout: Duration::from_millis(settings.timeout_ms),
            line_terminator: settings.line_terminator.clone(),
            response_delimiter: settings.response_delimiter as u8,
            debug: settings.debug,
            port,
        }
    }

    /// Name of the underlying port.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

/// Read one reply line from `reader`, stopping at `delimiter`.
///
/// Read timeouts shorter than `deadline` are retried; the line is trimmed and
/// the delimiter dropped.
fn read_reply<R: Read + ?Sized>(
    reader: &mut R,
    delimiter: u8,
    deadline: Duration,
    command: &str,
) -> LightResult<String> {
    let mut line: Vec<u8> = Vec::new();
    let mut buffer = [0u8; 1];
    let start = Instant::now();

    loop {
        if start.elapsed() > deadline {
            return Err(LightError::Timeout {
                command: command.to_string(),
                waited: deadline,
            });
        }

        match reader.read(&mut buffer) {
            Ok(1) => {
                if buffer[0] == delimiter {
                    break;
                }
                line.push(buffer[0]);
            }
            Ok(_) => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "serial port returned EOF",
                )
                .into());
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(String::from_utf8_lossy(&line).trim().to_string())
}

impl Transport for SerialTransport {
    fn send_command(&mut self, command: &str) -> LightResult<Response> {
        let framed = format!("{}{}", command, self.line_terminator);
        self.port.write_all(framed.as_bytes())?;
        self.port.flush()?;

        let reply = read_reply(
            &mut *self.port,
            self.response_delimiter,
            self.timeout,
            command,
        )?;

        if self.debug {
            debug!("[{}] {} -> {}", self.port_name, command, reply);
        } else {
            trace!("[{}] {} -> {}", self.port_name, command, reply);
        }

        Response::parse(&reply)
    }

    fn set_debug(&mut self, enabled: bool) {
        self.debug = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_reply_stops_at_delimiter() {
        let mut input = Cursor::new(b"[0,1]\r\n[0,0]\n".to_vec());
        let first = read_reply(&mut input, b'\n', Duration::from_secs(1), "A").unwrap();
        assert_eq!(first, "[0,1]");
        let second = read_reply(&mut input, b'\n', Duration::from_secs(1), "A").unwrap();
        assert_eq!(second, "[0,0]");
    }

    #[test]
    fn test_read_reply_eof() {
        let mut input = Cursor::new(b"[0,1".to_vec());
        let err = read_reply(&mut input, b'\n', Duration::from_secs(1), "A").unwrap_err();
        assert!(matches!(err, LightError::Io(_)));
    }

    struct SilentPort;

    impl Read for SilentPort {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            std::thread::sleep(Duration::from_millis(5));
            Err(std::io::ErrorKind::TimedOut.into())
        }
    }

    #[test]
    fn test_read_reply_deadline() {
        let err = read_reply(&mut SilentPort, b'\n', Duration::from_millis(30), "e").unwrap_err();
        match err {
            LightError::Timeout { command, .. } => assert_eq!(command, "e"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
