//! LineTransport trait for unified serial access
//!
//! This module provides a common trait for line-oriented serial
//! transports, enabling both real hardware ports (via serialport) and
//! scripted transports for testing.

use crate::error::Result;
use std::collections::VecDeque;
use std::time::Duration;

/// Size of the rolling window for recent inter-arrival gaps
const RECENT_WINDOW_SIZE: usize = 100;

/// Result of a single read attempt on a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A complete line arrived, already stripped of its terminator
    Line(String),
    /// The read timed out with no complete line; any partial data is
    /// retained for the next attempt
    TimedOut,
    /// The device closed the stream
    Eof,
}

/// Statistics for transport operations
///
/// Tracks line counts, throughput, and inter-arrival timing. Gaps are
/// measured by the caller between consecutive complete lines.
#[derive(Debug, Clone)]
pub struct TransportStats {
    /// Total number of complete lines received
    pub lines_received: u64,
    /// Total number of failed reads
    pub read_failures: u64,
    /// Total number of reads that timed out
    pub read_timeouts: u64,
    /// Total bytes received
    pub total_bytes_read: u64,

    // Inter-arrival timing
    /// Gap before the most recent line (milliseconds)
    pub last_gap_ms: u64,
    /// Minimum gap observed (milliseconds)
    pub min_gap_ms: u64,
    /// Maximum gap observed (milliseconds)
    pub max_gap_ms: u64,
    /// Rolling window of recent gaps for jitter calculation
    pub recent_gaps_ms: VecDeque<u64>,
}

impl Default for TransportStats {
    fn default() -> Self {
        Self {
            lines_received: 0,
            read_failures: 0,
            read_timeouts: 0,
            total_bytes_read: 0,
            last_gap_ms: 0,
            min_gap_ms: u64::MAX,
            max_gap_ms: 0,
            recent_gaps_ms: VecDeque::with_capacity(RECENT_WINDOW_SIZE),
        }
    }
}

impl TransportStats {
    /// Record a received line.
    ///
    /// `gap_ms` is the time since the previous line; the first line of
    /// a session has no gap.
    pub fn record_line(&mut self, gap_ms: Option<u64>, bytes: u64) {
        self.lines_received += 1;
        self.total_bytes_read += bytes;

        if let Some(gap) = gap_ms {
            self.last_gap_ms = gap;

            if gap < self.min_gap_ms {
                self.min_gap_ms = gap;
            }
            if gap > self.max_gap_ms {
                self.max_gap_ms = gap;
            }

            self.recent_gaps_ms.push_back(gap);
            if self.recent_gaps_ms.len() > RECENT_WINDOW_SIZE {
                self.recent_gaps_ms.pop_front();
            }
        }
    }

    /// Record a read that timed out with no data
    pub fn record_timeout(&mut self) {
        self.read_timeouts += 1;
    }

    /// Record a failed read
    pub fn record_failure(&mut self) {
        self.read_failures += 1;
    }

    /// Calculate jitter (max - min) over the recent window in milliseconds
    pub fn jitter_ms(&self) -> u64 {
        if self.recent_gaps_ms.is_empty() {
            return 0;
        }
        let min = self.recent_gaps_ms.iter().min().copied().unwrap_or(0);
        let max = self.recent_gaps_ms.iter().max().copied().unwrap_or(0);
        max.saturating_sub(min)
    }

    /// Get the recent minimum gap (from the rolling window)
    pub fn recent_min_ms(&self) -> u64 {
        self.recent_gaps_ms.iter().min().copied().unwrap_or(0)
    }

    /// Get the recent maximum gap (from the rolling window)
    pub fn recent_max_ms(&self) -> u64 {
        self.recent_gaps_ms.iter().max().copied().unwrap_or(0)
    }

    /// Effective line rate in lines per second over the recent window
    pub fn effective_line_rate(&self) -> f64 {
        if self.recent_gaps_ms.is_empty() {
            return 0.0;
        }
        let mean_ms = self.recent_gaps_ms.iter().sum::<u64>() as f64
            / self.recent_gaps_ms.len() as f64;
        if mean_ms <= 0.0 {
            0.0
        } else {
            1000.0 / mean_ms
        }
    }

    /// Reset all statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Unified interface for line-oriented transports
///
/// This trait provides a common interface for both real serial ports
/// and scripted transports for testing. Implementations must be `Send`
/// so the backend worker can own them on its own thread.
///
/// # Example
///
/// ```ignore
/// fn pump(transport: &mut dyn LineTransport) -> Result<Option<String>> {
///     match transport.read_line()? {
///         ReadOutcome::Line(line) => Ok(Some(line)),
///         ReadOutcome::TimedOut => Ok(None),
///         ReadOutcome::Eof => Ok(None),
///     }
/// }
/// ```
pub trait LineTransport: Send {
    /// Enumerate available port names
    fn list_ports(&self) -> Result<Vec<String>>;

    /// Open the named port.
    ///
    /// `read_timeout` bounds each blocking read so the worker can check
    /// for shutdown between attempts.
    fn open(&mut self, port_name: &str, baud_rate: u32, read_timeout: Duration) -> Result<()>;

    /// Check if a port is currently open
    fn is_open(&self) -> bool;

    /// The name of the open port, if any
    fn port_name(&self) -> Option<&str>;

    /// Attempt to read one line
    fn read_line(&mut self) -> Result<ReadOutcome>;

    /// Discard any buffered input, including partial lines
    fn discard_input(&mut self) -> Result<()>;

    /// Close the port
    fn close(&mut self);

    /// Get transport statistics
    fn stats(&self) -> &TransportStats;

    /// Get mutable reference to transport statistics
    fn stats_mut(&mut self) -> &mut TransportStats;

    /// Reset transport statistics
    fn reset_stats(&mut self) {
        self.stats_mut().reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_record_lines() {
        let mut stats = TransportStats::default();

        stats.record_line(None, 5);
        stats.record_line(Some(100), 6);
        stats.record_line(Some(300), 4);

        assert_eq!(stats.lines_received, 3);
        assert_eq!(stats.total_bytes_read, 15);
        assert_eq!(stats.last_gap_ms, 300);
        assert_eq!(stats.min_gap_ms, 100);
        assert_eq!(stats.max_gap_ms, 300);
        assert_eq!(stats.jitter_ms(), 200);
    }

    #[test]
    fn test_stats_first_line_has_no_gap() {
        let mut stats = TransportStats::default();
        stats.record_line(None, 8);

        assert_eq!(stats.lines_received, 1);
        assert_eq!(stats.min_gap_ms, u64::MAX);
        assert_eq!(stats.jitter_ms(), 0);
        assert_eq!(stats.effective_line_rate(), 0.0);
    }

    #[test]
    fn test_stats_effective_line_rate() {
        let mut stats = TransportStats::default();
        stats.record_line(None, 4);
        for _ in 0..10 {
            stats.record_line(Some(500), 4);
        }

        // One line every 500ms is two lines per second
        assert!((stats.effective_line_rate() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_stats_rolling_window_is_bounded() {
        let mut stats = TransportStats::default();
        for i in 0..(RECENT_WINDOW_SIZE + 50) {
            stats.record_line(Some(i as u64), 1);
        }

        assert_eq!(stats.recent_gaps_ms.len(), RECENT_WINDOW_SIZE);
        // The oldest gaps fell out of the window
        assert_eq!(stats.recent_min_ms(), 50);
    }

    #[test]
    fn test_stats_reset() {
        let mut stats = TransportStats::default();
        stats.record_line(Some(10), 100);
        stats.record_timeout();
        stats.record_failure();

        stats.reset();
        assert_eq!(stats.lines_received, 0);
        assert_eq!(stats.read_timeouts, 0);
        assert_eq!(stats.read_failures, 0);
        assert_eq!(stats.min_gap_ms, u64::MAX);
        assert!(stats.recent_gaps_ms.is_empty());
    }
}
