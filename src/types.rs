//! Core data types for SerialVis-RS
//!
//! This module contains the fundamental data structures used throughout
//! the application for representing samples, axis bounds, the scrolling
//! log, and connection state.
//!
//! # Main Types
//!
//! - [`Sample`] - A single plotted value with its offset into the time window
//! - [`AxisBounds`] - Padded Y-axis limits derived from the visible values
//! - [`LogEntry`] / [`LogBuffer`] - Timestamped scrolling log with bounded retention
//! - [`ConnectionStatus`] - Lifecycle state of the serial connection
//! - [`SessionStats`] - Counters describing the current reading session
//!
//! # Log Retention
//!
//! The log keeps at most [`MAX_LOG_ENTRIES`] lines. When the buffer is
//! full, the oldest entry is evicted before the new one is appended.

use chrono::{DateTime, Local};
use std::collections::VecDeque;

/// Maximum number of lines retained in the scrolling log
pub const MAX_LOG_ENTRIES: usize = 100;

/// Threshold below which a value range is treated as flat
pub const AXIS_EPSILON: f64 = 0.001;

/// Fraction of the value range added above and below as headroom
pub const AXIS_PADDING_RATIO: f64 = 0.1;

/// Absolute padding applied to each side when the range is flat
pub const AXIS_UNIT_PADDING: f64 = 1.0;

/// A single plotted sample, positioned relative to the window start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Minutes elapsed since the window start
    pub offset_minutes: f64,
    /// The parsed numeric value
    pub value: f64,
}

impl Sample {
    /// Create a new sample at the given offset
    pub fn new(offset_minutes: f64, value: f64) -> Self {
        Self {
            offset_minutes,
            value,
        }
    }
}

/// Y-axis limits for the plot, recomputed as values arrive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBounds {
    /// Lower axis limit
    pub min: f64,
    /// Upper axis limit
    pub max: f64,
}

impl Default for AxisBounds {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

impl AxisBounds {
    /// Create bounds with explicit limits
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Fit the bounds to an observed value range.
    ///
    /// A spread wider than [`AXIS_EPSILON`] gets proportional headroom of
    /// [`AXIS_PADDING_RATIO`] on each side. A flat range gets one unit of
    /// padding on each side so the trace never sits on the axis edge.
    /// `None` (no visible values) leaves the bounds untouched.
    pub fn fit(&mut self, range: Option<(f64, f64)>) {
        let Some((min, max)) = range else {
            return;
        };
        let span = max - min;
        if span > AXIS_EPSILON {
            let pad = span * AXIS_PADDING_RATIO;
            self.min = min - pad;
            self.max = max + pad;
        } else {
            self.min = min - AXIS_UNIT_PADDING;
            self.max = max + AXIS_UNIT_PADDING;
        }
    }

}

/// A single line in the scrolling log, stamped at arrival time
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Wall-clock time the line arrived
    pub received_at: DateTime<Local>,
    /// The line text, already stripped of its terminator
    pub text: String,
}

impl LogEntry {
    /// Create an entry stamped with the current wall-clock time
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            received_at: Local::now(),
            text: text.into(),
        }
    }

    /// Create an entry with an explicit timestamp
    pub fn at(received_at: DateTime<Local>, text: impl Into<String>) -> Self {
        Self {
            received_at,
            text: text.into(),
        }
    }

    /// Render the entry as `[HH:MM:SS] text` for display
    pub fn formatted(&self) -> String {
        format!("{} {}", self.received_at.format("[%H:%M:%S]"), self.text)
    }
}

/// Bounded scrolling log of received lines
///
/// Newest entries are at the back. Once the capacity is reached the
/// oldest entry is dropped for every new one appended.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LogBuffer {
    /// Create a log buffer with the default capacity of [`MAX_LOG_ENTRIES`]
    pub fn new() -> Self {
        Self::with_capacity(MAX_LOG_ENTRIES)
    }

    /// Create a log buffer holding at most `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest if the buffer is full
    pub fn push(&mut self, entry: LogEntry) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Iterate entries from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// The most recently appended entry
    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Represents the state of the serial connection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// No connection has been attempted yet
    #[default]
    NotConnected,
    /// Port enumeration and opening in progress
    Connecting,
    /// Enumeration found no ports to open
    NoPortsFound,
    /// Connected to the named port and reading
    Connected(String),
    /// The connection failed or was lost
    Failed(String),
}

impl ConnectionStatus {
    /// Whether the connection is open and reading
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected(_))
    }

    /// Whether this state ends the reading session
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConnectionStatus::NoPortsFound | ConnectionStatus::Failed(_)
        )
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::NotConnected => write!(f, "Not connected"),
            ConnectionStatus::Connecting => write!(f, "Connecting..."),
            ConnectionStatus::NoPortsFound => write!(f, "No serial ports found"),
            ConnectionStatus::Connected(port) => write!(f, "Connected to {}", port),
            ConnectionStatus::Failed(message) => write!(f, "Error: {}", message),
        }
    }
}

/// Statistics about the current reading session
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Number of lines received from the port
    pub lines_received: u64,
    /// Number of lines that parsed into a plottable value
    pub samples_parsed: u64,
    /// Number of lines that were empty after trimming
    pub empty_lines: u64,
    /// Number of lines that did not parse as a number
    pub malformed_lines: u64,
    /// Number of values rejected by the configured bounds
    pub out_of_range: u64,
    /// Number of read attempts that timed out with no data
    pub read_timeouts: u64,
    /// Total bytes received over the port
    pub bytes_read: u64,
    /// Number of messages dropped due to queue backpressure
    pub dropped_messages: u64,

    // Inter-arrival timing over the recent window
    /// Shortest gap between consecutive lines (milliseconds)
    pub min_gap_ms: u64,
    /// Longest gap between consecutive lines (milliseconds)
    pub max_gap_ms: u64,
    /// Gap jitter (max - min) in milliseconds
    pub jitter_ms: u64,
    /// Current effective line rate in lines per second
    pub effective_line_rate: f64,
}

impl SessionStats {
    /// Fraction of received lines that yielded a value, as a percentage
    pub fn parse_rate(&self) -> f64 {
        if self.lines_received == 0 {
            100.0
        } else {
            (self.samples_parsed as f64 / self.lines_received as f64) * 100.0
        }
    }

    /// Total number of lines skipped without producing a sample
    pub fn skipped_lines(&self) -> u64 {
        self.empty_lines + self.malformed_lines + self.out_of_range
    }
}
