//! Backend module for serial port reading
//!
//! This module handles all serial communication in a separate thread to keep
//! the UI responsive. It uses crossbeam channels for thread-safe communication
//! with the frontend.
//!
//! # Architecture
//!
//! The backend runs in a separate thread from the UI, communicating via channels:
//!
//! - [`BackendCommand`] - Messages sent from UI to backend (connect, disconnect, etc.)
//! - [`BackendMessage`] - Messages sent from backend to UI (samples, lines, status)
//! - [`FrontendReceiver`] - UI-side handle for sending commands and receiving messages
//! - [`SerialBackend`] - Main backend entry point that hosts the worker loop
//!
//! # Components
//!
//! - [`SerialTransport`] - Line-oriented reader over a real serial port
//! - [`MockTransport`] - Mock device for testing without hardware (feature-gated)
//! - [`BackendWorker`] - Main worker loop that processes commands and pumps lines
//!
//! # Example
//!
//! ```no_run
//! use serialvis_rs::backend::SerialBackend;
//! use serialvis_rs::config::Config;
//!
//! let (backend, frontend) = SerialBackend::new(Config::default());
//!
//! // Spawn backend thread
//! std::thread::spawn(move || backend.run());
//!
//! // Ask for a connection, then drain whatever arrives
//! frontend.connect();
//! for msg in frontend.drain() {
//!     println!("{:?}", msg);
//! }
//! ```

pub mod serial;
pub mod transport;
pub mod worker;

#[cfg(any(test, feature = "mock-serial"))]
pub mod mock;

pub use serial::SerialTransport;
pub use transport::{LineTransport, ReadOutcome, TransportStats};
pub use worker::BackendWorker;

#[cfg(any(test, feature = "mock-serial"))]
pub use mock::{MockLinePattern, MockTransport};

use crate::config::Config;
use crate::types::{ConnectionStatus, SessionStats};
use chrono::{DateTime, Local};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

/// Message sent from the UI to the backend
#[derive(Debug, Clone)]
pub enum BackendCommand {
    /// Pick a port, open it, and start a reading session
    Connect,
    /// Close the port and end the session
    Disconnect,
    /// Request current statistics
    RequestStats,
    /// Shutdown the backend
    Shutdown,
    /// Use mock transport instead of real hardware (only available with mock-serial feature)
    #[cfg(any(test, feature = "mock-serial"))]
    UseMockTransport(bool),
}

/// Message sent from the backend to the UI
#[derive(Debug, Clone)]
pub enum BackendMessage {
    /// Connection status changed
    ConnectionStatus(ConnectionStatus),
    /// Connection error occurred
    ConnectionError(String),
    /// A numeric reading parsed from the device
    Sample {
        /// Parsed value
        value: f64,
        /// Monotonic arrival time, used for window placement
        received_at: Instant,
    },
    /// A raw line for the scrolling log
    Line {
        /// Line text with the terminator stripped
        text: String,
        /// Wall-clock arrival time, used for the log timestamp
        received_at: DateTime<Local>,
    },
    /// Statistics update
    Stats(SessionStats),
    /// Backend is shutting down
    Shutdown,
}

/// Frontend receiver for backend messages
pub struct FrontendReceiver {
    /// Receiver for backend messages
    pub receiver: Receiver<BackendMessage>,
    /// Sender for commands to the backend
    pub command_sender: Sender<BackendCommand>,
}

impl FrontendReceiver {
    /// Try to receive a message without blocking
    pub fn try_recv(&self) -> Option<BackendMessage> {
        self.receiver.try_recv().ok()
    }

    /// Receive all pending messages
    pub fn drain(&self) -> Vec<BackendMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.receiver.try_recv() {
            messages.push(msg);
        }
        messages
    }

    /// Send a command to the backend
    pub fn send_command(&self, cmd: BackendCommand) -> bool {
        self.command_sender.send(cmd).is_ok()
    }

    /// Request a connection
    pub fn connect(&self) {
        let _ = self.command_sender.send(BackendCommand::Connect);
    }

    /// Request disconnection
    pub fn disconnect(&self) {
        let _ = self.command_sender.send(BackendCommand::Disconnect);
    }

    /// Request a statistics snapshot
    pub fn request_stats(&self) {
        let _ = self.command_sender.send(BackendCommand::RequestStats);
    }

    /// Set whether to use the mock transport (only available with mock-serial feature)
    #[cfg(any(test, feature = "mock-serial"))]
    pub fn use_mock_transport(&self, use_mock: bool) {
        let _ = self
            .command_sender
            .send(BackendCommand::UseMockTransport(use_mock));
    }

    /// Request shutdown
    pub fn shutdown(&self) {
        let _ = self.command_sender.send(BackendCommand::Shutdown);
    }
}

/// The serial backend that runs in a separate thread
pub struct SerialBackend {
    /// Configuration
    config: Config,
    /// Receiver for commands from the UI
    command_receiver: Receiver<BackendCommand>,
    /// Sender for messages to the UI
    message_sender: Sender<BackendMessage>,
    /// Running flag
    running: Arc<AtomicBool>,
    /// Transport override, used by tests to inject a scripted device
    transport: Option<Box<dyn LineTransport>>,
}

impl SerialBackend {
    /// Create a new serial backend with communication channels
    pub fn new(config: Config) -> (Self, FrontendReceiver) {
        Self::build(config, None)
    }

    /// Create a backend over an explicit transport
    pub fn with_transport(
        config: Config,
        transport: Box<dyn LineTransport>,
    ) -> (Self, FrontendReceiver) {
        Self::build(config, Some(transport))
    }

    fn build(config: Config, transport: Option<Box<dyn LineTransport>>) -> (Self, FrontendReceiver) {
        let (cmd_tx, cmd_rx) = bounded(256);
        // Use bounded channel for backpressure - prevents memory spikes if UI can't keep up
        // 10,000 messages is hours of headroom at human-timescale line rates
        let (msg_tx, msg_rx) = bounded(10_000);

        let backend = Self {
            config,
            command_receiver: cmd_rx,
            message_sender: msg_tx,
            running: Arc::new(AtomicBool::new(true)),
            transport,
        };

        let frontend = FrontendReceiver {
            receiver: msg_rx,
            command_sender: cmd_tx,
        };

        (backend, frontend)
    }

    /// Run the backend loop
    pub fn run(self) {
        let mut worker = match self.transport {
            Some(transport) => BackendWorker::with_transport(
                self.config,
                transport,
                self.command_receiver,
                self.message_sender,
                self.running,
            ),
            None => BackendWorker::new(
                self.config,
                self.command_receiver,
                self.message_sender,
                self.running,
            ),
        };
        worker.run();
    }

    /// Get a handle to stop the backend
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_backend_creation() {
        let (backend, frontend) = SerialBackend::new(Config::default());

        // Backend should be running
        assert!(backend.running.load(Ordering::SeqCst));

        // Should be able to send commands
        assert!(frontend.send_command(BackendCommand::Shutdown));
    }

    #[test]
    fn test_frontend_receiver_commands() {
        let (backend, frontend) = SerialBackend::new(Config::default());

        frontend.connect();
        frontend.disconnect();
        frontend.request_stats();
        frontend.shutdown();

        let mut queued = 0;
        while backend.command_receiver.try_recv().is_ok() {
            queued += 1;
        }
        assert_eq!(queued, 4);
    }

    #[test]
    fn test_drain_on_empty_channel() {
        let (_backend, frontend) = SerialBackend::new(Config::default());

        assert!(frontend.drain().is_empty());
        assert!(frontend.try_recv().is_none());
    }

    #[test]
    fn test_stop_handle_stops_worker() {
        let (backend, _frontend) = SerialBackend::new(Config::default());
        let handle = backend.stop_handle();

        let join = std::thread::spawn(move || backend.run());
        handle.store(false, Ordering::SeqCst);
        join.join().unwrap();
    }
}
