//! Error handling for the SerialVis-RS application
//!
//! This module defines custom error types and a Result alias for use
//! throughout the application.

use thiserror::Error;

/// Main error type for SerialVis-RS operations
#[derive(Error, Debug)]
pub enum SerialVisError {
    /// No serial ports were found during enumeration
    #[error("No serial ports found")]
    NoPortsFound,

    /// Errors from the serial port layer
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// The device closed the connection (end of stream while reading)
    #[error("Connection closed: {0}")]
    Disconnected(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<SerialVisError>,
    },
}

impl SerialVisError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        SerialVisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error ends the reading session.
    ///
    /// Connection-level failures are fatal; configuration and channel
    /// errors are reported but leave the session running.
    pub fn is_fatal(&self) -> bool {
        match self {
            SerialVisError::NoPortsFound
            | SerialVisError::Serial(_)
            | SerialVisError::Disconnected(_)
            | SerialVisError::Io(_) => true,
            SerialVisError::Config(_)
            | SerialVisError::Channel(_)
            | SerialVisError::Serialization(_) => false,
            SerialVisError::WithContext { source, .. } => source.is_fatal(),
        }
    }
}

/// Result type alias for SerialVis-RS operations
pub type Result<T> = std::result::Result<T, SerialVisError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
