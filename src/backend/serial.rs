//! Serial port transport
//!
//! Implements [`LineTransport`] over a real serial port. Reads go
//! through a buffered reader with a short timeout so the owning worker
//! can check for shutdown between attempts; a partial line survives a
//! timeout and completes on a later read. Bytes that are not valid
//! UTF-8 are replaced rather than treated as a read failure, since
//! boot-time garbage on the wire is expected.

use crate::backend::transport::{LineTransport, ReadOutcome, TransportStats};
use crate::error::{Result, SerialVisError};
use serialport::{ClearBuffer, DataBits, Parity, SerialPort, StopBits};
use std::io::{BufRead, BufReader, ErrorKind};
use std::time::Duration;

/// Transport backed by a system serial port
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
    reader: Option<BufReader<Box<dyn SerialPort>>>,
    port_name: Option<String>,
    pending: Vec<u8>,
    stats: TransportStats,
}

impl SerialTransport {
    /// Create a transport with no port open
    pub fn new() -> Self {
        Self {
            port: None,
            reader: None,
            port_name: None,
            pending: Vec::new(),
            stats: TransportStats::default(),
        }
    }
}

impl Default for SerialTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl LineTransport for SerialTransport {
    fn list_ports(&self) -> Result<Vec<String>> {
        let ports = serialport::available_ports()?;
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }

    fn open(&mut self, port_name: &str, baud_rate: u32, read_timeout: Duration) -> Result<()> {
        let port = serialport::new(port_name, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(read_timeout)
            .open()?;

        let reader = BufReader::new(port.try_clone()?);

        self.port = Some(port);
        self.reader = Some(reader);
        self.port_name = Some(port_name.to_string());
        self.pending.clear();
        self.stats.reset();

        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    fn read_line(&mut self) -> Result<ReadOutcome> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| SerialVisError::Disconnected("port not open".to_string()))?;

        match reader.read_until(b'\n', &mut self.pending) {
            Ok(0) => Ok(ReadOutcome::Eof),
            Ok(_) => {
                let line = String::from_utf8_lossy(&self.pending)
                    .trim_end_matches(['\r', '\n'])
                    .to_string();
                self.pending.clear();
                Ok(ReadOutcome::Line(line))
            }
            // Partial bytes stay in `pending` and complete later
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
                Ok(ReadOutcome::TimedOut)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn discard_input(&mut self) -> Result<()> {
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| SerialVisError::Disconnected("port not open".to_string()))?;

        port.clear(ClearBuffer::Input)?;

        // The reader's internal buffer may still hold bytes; rebuild it
        self.reader = Some(BufReader::new(port.try_clone()?));
        self.pending.clear();

        Ok(())
    }

    fn close(&mut self) {
        // Dropping the handles closes the port
        self.reader = None;
        self.port = None;
        self.port_name = None;
        self.pending.clear();
    }

    fn stats(&self) -> &TransportStats {
        &self.stats
    }

    fn stats_mut(&mut self) -> &mut TransportStats {
        &mut self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transport_is_closed() {
        let transport = SerialTransport::new();
        assert!(!transport.is_open());
        assert!(transport.port_name().is_none());
    }

    #[test]
    fn test_read_on_closed_port_fails() {
        let mut transport = SerialTransport::new();
        assert!(transport.read_line().is_err());
        assert!(transport.discard_input().is_err());
    }

    #[test]
    fn test_open_missing_port_fails() {
        let mut transport = SerialTransport::new();
        let result = transport.open(
            "/dev/serialvis-no-such-port",
            9600,
            Duration::from_millis(100),
        );
        assert!(result.is_err());
        assert!(!transport.is_open());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut transport = SerialTransport::new();
        transport.close();
        transport.close();
        assert!(!transport.is_open());
    }
}
