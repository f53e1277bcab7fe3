//! Backend Worker Thread Implementation
//!
//! This module contains the read loop that runs in a separate thread
//! and owns the serial connection. It communicates with the
//! presentation thread through crossbeam channels.
//!
//! # Responsibilities
//!
//! The worker thread handles:
//!
//! - **Command processing**: Responds to frontend commands (connect, disconnect, shutdown)
//! - **Port selection**: Prefers the configured port, else falls back to the first enumerated one
//! - **Stabilization**: Discards input, waits, and discards again after opening
//! - **Line pumping**: Blocking reads with a short timeout, parsed into samples
//! - **Statistics tracking**: Line counts, parse outcomes, and inter-arrival timing
//!
//! # Cancellation
//!
//! Each blocking read is bounded by the configured timeout, so the loop
//! observes the running flag and pending commands at that cadence even
//! when the device is silent.

use crate::backend::serial::SerialTransport;
use crate::backend::transport::{LineTransport, ReadOutcome};
use crate::backend::{BackendCommand, BackendMessage};
use crate::config::Config;
use crate::error::{Result, ResultExt, SerialVisError};
use crate::parser::{parse_line, ParseOutcome, ValueBounds};
use crate::types::{ConnectionStatus, SessionStats};
use chrono::Local;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(any(test, feature = "mock-serial"))]
use crate::backend::mock::MockTransport;

/// How often session statistics are pushed to the frontend
const STATS_INTERVAL: Duration = Duration::from_millis(500);

/// Sleep between loop iterations while no port is open
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// The backend worker that runs the read loop
pub struct BackendWorker {
    /// Application configuration
    config: Config,
    /// Command receiver from the frontend
    command_rx: Receiver<BackendCommand>,
    /// Message sender to the frontend
    message_tx: Sender<BackendMessage>,
    /// Running flag
    running: Arc<AtomicBool>,
    /// Line transport (supports both real and mock ports)
    transport: Box<dyn LineTransport>,
    /// Whether currently using a mock transport
    #[cfg(any(test, feature = "mock-serial"))]
    is_mock_transport: bool,
    /// Accepted value range for parsed readings
    bounds: ValueBounds,
    /// Current connection status
    connection_status: ConnectionStatus,
    /// Whether a reading session is active
    reading: bool,
    /// Arrival time of the previous line, for gap tracking
    last_line_at: Option<Instant>,
    /// Session statistics (parse tallies; transport numbers are merged in)
    stats: SessionStats,
    /// Last time stats were sent to the frontend
    last_stats_time: Instant,
}

impl BackendWorker {
    /// Create a worker that reads from a real serial port
    pub fn new(
        config: Config,
        command_rx: Receiver<BackendCommand>,
        message_tx: Sender<BackendMessage>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self::with_transport(
            config,
            Box::new(SerialTransport::new()),
            command_rx,
            message_tx,
            running,
        )
    }

    /// Create a worker over an explicit transport
    pub fn with_transport(
        config: Config,
        transport: Box<dyn LineTransport>,
        command_rx: Receiver<BackendCommand>,
        message_tx: Sender<BackendMessage>,
        running: Arc<AtomicBool>,
    ) -> Self {
        let bounds = config.window.value_bounds();

        Self {
            config,
            command_rx,
            message_tx,
            running,
            transport,
            #[cfg(any(test, feature = "mock-serial"))]
            is_mock_transport: false,
            bounds,
            connection_status: ConnectionStatus::NotConnected,
            reading: false,
            last_line_at: None,
            stats: SessionStats::default(),
            last_stats_time: Instant::now(),
        }
    }

    /// Run the main worker loop
    pub fn run(&mut self) {
        tracing::info!("Backend worker started");

        while self.running.load(Ordering::SeqCst) {
            // Process pending commands
            self.process_commands();

            if self.reading && self.connection_status.is_connected() {
                // The blocking read doubles as the loop's pacing
                self.pump_transport();

                if self.last_stats_time.elapsed() >= STATS_INTERVAL {
                    self.send_stats();
                    self.last_stats_time = Instant::now();
                }
            } else {
                std::thread::sleep(IDLE_POLL_INTERVAL);
            }
        }

        // Cleanup
        self.transport.close();

        let _ = self.message_tx.send(BackendMessage::Shutdown);
        tracing::info!("Backend worker stopped");
    }

    /// Process pending commands from the frontend
    fn process_commands(&mut self) {
        loop {
            match self.command_rx.try_recv() {
                Ok(cmd) => self.handle_command(cmd),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.running.store(false, Ordering::SeqCst);
                    break;
                }
            }
        }
    }

    /// Handle a single command
    fn handle_command(&mut self, cmd: BackendCommand) {
        match cmd {
            BackendCommand::Connect => {
                self.handle_connect();
            }
            BackendCommand::Disconnect => {
                self.handle_disconnect();
            }
            BackendCommand::RequestStats => {
                self.send_stats();
            }
            BackendCommand::Shutdown => {
                self.running.store(false, Ordering::SeqCst);
            }
            #[cfg(any(test, feature = "mock-serial"))]
            BackendCommand::UseMockTransport(use_mock) => {
                // Drop any open connection before swapping
                if self.transport.is_open() {
                    self.reading = false;
                    self.transport.close();
                    self.update_connection_status(ConnectionStatus::NotConnected);
                }

                if use_mock && !self.is_mock_transport {
                    self.transport = Box::new(MockTransport::new());
                    self.is_mock_transport = true;
                    tracing::info!("Switched to mock transport");
                } else if !use_mock && self.is_mock_transport {
                    self.transport = Box::new(SerialTransport::new());
                    self.is_mock_transport = false;
                    tracing::info!("Switched to serial transport");
                }
            }
        }
    }

    /// Handle connect command
    fn handle_connect(&mut self) {
        if self.transport.is_open() {
            self.reading = false;
            self.transport.close();
        }

        self.update_connection_status(ConnectionStatus::Connecting);

        match self.open_preferred_port() {
            Ok(port_name) => {
                self.reading = true;
                self.last_line_at = None;
                self.stats = SessionStats::default();
                self.transport.reset_stats();
                self.last_stats_time = Instant::now();
                tracing::info!("Connected to {}", port_name);
                self.update_connection_status(ConnectionStatus::Connected(port_name));
            }
            Err(e) => {
                let status = match &e {
                    SerialVisError::NoPortsFound => ConnectionStatus::NoPortsFound,
                    _ => ConnectionStatus::Failed(e.to_string()),
                };
                tracing::error!("Failed to connect: {}", e);
                self.update_connection_status(status);
                let _ = self
                    .message_tx
                    .send(BackendMessage::ConnectionError(e.to_string()));
            }
        }
    }

    /// Enumerate ports, pick one, open it, and let the device settle.
    ///
    /// The configured port wins when present; otherwise the first
    /// enumerated port is used. No ports at all is fatal to the session.
    fn open_preferred_port(&mut self) -> Result<String> {
        let ports = self.transport.list_ports()?;
        if ports.is_empty() {
            return Err(SerialVisError::NoPortsFound);
        }

        let preferred = &self.config.connection.preferred_port;
        let port_name = if ports.iter().any(|p| p == preferred) {
            preferred.clone()
        } else {
            tracing::warn!(
                "Preferred port {} not found, falling back to {}",
                preferred,
                ports[0]
            );
            ports[0].clone()
        };

        let timeout = Duration::from_millis(self.config.connection.read_timeout_ms);
        self.transport
            .open(&port_name, self.config.connection.baud_rate, timeout)
            .with_context(|| format!("Opening {}", port_name))?;
        self.stabilize()?;

        Ok(port_name)
    }

    /// Drop device boot-up noise: discard input, wait for the device to
    /// settle, then discard whatever arrived during the wait.
    fn stabilize(&mut self) -> Result<()> {
        self.transport.discard_input()?;

        let delay = Duration::from_millis(self.config.connection.stabilize_delay_ms);
        if !delay.is_zero() {
            // Sleep in slices so shutdown is not held up by the delay
            let deadline = Instant::now() + delay;
            while self.running.load(Ordering::SeqCst) {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                std::thread::sleep((deadline - now).min(Duration::from_millis(50)));
            }
        }

        self.transport.discard_input()?;
        Ok(())
    }

    /// Handle disconnect command
    fn handle_disconnect(&mut self) {
        if let Some(name) = self.transport.port_name() {
            tracing::info!("Disconnected from {}", name);
        }
        self.reading = false;
        self.transport.close();
        self.update_connection_status(ConnectionStatus::NotConnected);
    }

    /// Attempt one read and dispatch the outcome
    fn pump_transport(&mut self) {
        match self.transport.read_line() {
            Ok(ReadOutcome::Line(line)) => self.handle_line(line),
            Ok(ReadOutcome::TimedOut) => {
                self.transport.stats_mut().record_timeout();
            }
            Ok(ReadOutcome::Eof) => {
                self.fail_session(SerialVisError::Disconnected(
                    "device closed the connection".to_string(),
                ));
            }
            Err(e) => {
                self.transport.stats_mut().record_failure();
                if e.is_fatal() {
                    self.fail_session(e);
                } else {
                    tracing::warn!("Transient read error: {}", e);
                }
            }
        }
    }

    /// Parse one received line and forward the results
    fn handle_line(&mut self, line: String) {
        let now = Instant::now();
        let gap_ms = self
            .last_line_at
            .map(|t| now.duration_since(t).as_millis() as u64);
        self.last_line_at = Some(now);
        self.transport
            .stats_mut()
            .record_line(gap_ms, line.len() as u64 + 1);

        self.stats.lines_received += 1;

        match parse_line(&line, &self.bounds) {
            ParseOutcome::Value(value) => {
                self.stats.samples_parsed += 1;
                self.try_send_message(BackendMessage::Sample {
                    value,
                    received_at: now,
                });
            }
            ParseOutcome::Empty => {
                // Nothing to plot or log
                self.stats.empty_lines += 1;
                return;
            }
            ParseOutcome::Malformed => {
                self.stats.malformed_lines += 1;
                tracing::trace!("Dropped malformed line: {:?}", line);
            }
            ParseOutcome::OutOfRange(value) => {
                self.stats.out_of_range += 1;
                tracing::trace!("Dropped out-of-range value: {}", value);
            }
        }

        // Every non-empty line also feeds the scrolling log
        self.try_send_message(BackendMessage::Line {
            text: line,
            received_at: Local::now(),
        });
    }

    /// End the session after a connection-level failure
    fn fail_session(&mut self, error: SerialVisError) {
        tracing::error!("Session ended: {}", error);
        self.reading = false;
        self.transport.close();
        self.update_connection_status(ConnectionStatus::Failed(error.to_string()));
        let _ = self
            .message_tx
            .send(BackendMessage::ConnectionError(error.to_string()));
    }

    /// Update connection status and notify the frontend
    fn update_connection_status(&mut self, status: ConnectionStatus) {
        self.connection_status = status.clone();
        let _ = self
            .message_tx
            .send(BackendMessage::ConnectionStatus(status));
    }

    /// Send statistics to the frontend (using try_send for backpressure)
    fn send_stats(&mut self) {
        let mut stats = self.stats.clone();
        {
            let t = self.transport.stats();
            stats.read_timeouts = t.read_timeouts;
            stats.bytes_read = t.total_bytes_read;
            stats.min_gap_ms = t.recent_min_ms();
            stats.max_gap_ms = t.recent_max_ms();
            stats.jitter_ms = t.jitter_ms();
            stats.effective_line_rate = t.effective_line_rate();
        }
        self.try_send_message(BackendMessage::Stats(stats));
    }

    /// Try to send a message, tracking dropped messages if the queue is full
    ///
    /// Uses try_send() to avoid blocking. If the queue is full, the
    /// message is dropped and the dropped_messages counter is incremented.
    fn try_send_message(&mut self, msg: BackendMessage) {
        if self.message_tx.try_send(msg).is_err() {
            self.stats.dropped_messages += 1;
        }
    }
}
