//! Presentation State
//!
//! Single consumer of backend messages. All presentation state lives here:
//! the sliding time window, the value axis, the scrolling log, and the
//! latest connection status and statistics. The UI thread applies drained
//! messages, ticks the rollover timer, then renders from the accessors.
//!
//! Keeping ownership in one place means no locks around the sample buffer
//! and no torn reads between the plot and the axis.

use crate::backend::BackendMessage;
use crate::config::Config;
use crate::types::{AxisBounds, ConnectionStatus, LogBuffer, LogEntry, SessionStats};
use crate::window::{InsertOutcome, TimeWindow};
use std::fmt::Write as _;
use std::time::Instant;

/// How much of the plot must be repainted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Redraw {
    /// Nothing changed since the last take
    #[default]
    None,
    /// New points were appended; existing points are still valid
    Append,
    /// The window rolled or was cleared; repaint everything
    Full,
}

impl Redraw {
    /// Raise the pending level, never lower it
    fn escalate(&mut self, other: Redraw) {
        let level = |r: &Redraw| match r {
            Redraw::None => 0,
            Redraw::Append => 1,
            Redraw::Full => 2,
        };
        if level(&other) > level(self) {
            *self = other;
        }
    }
}

/// Presentation state fed by backend messages
pub struct ViewState {
    window: TimeWindow,
    bounds: AxisBounds,
    log: LogBuffer,
    status: ConnectionStatus,
    stats: SessionStats,
    last_error: Option<String>,
    pending_redraw: Redraw,
    /// Times the window rolled over, by insert or by timer
    window_resets: u64,
    shutdown: bool,
}

impl ViewState {
    /// Create presentation state sized from the configuration
    pub fn new(config: &Config) -> Self {
        Self::with_window_start(config, Instant::now())
    }

    /// Create with an explicit window start, for deterministic replays
    pub fn with_window_start(config: &Config, start: Instant) -> Self {
        Self {
            window: TimeWindow::starting_at(start, config.window.duration_minutes),
            bounds: AxisBounds::default(),
            log: LogBuffer::with_capacity(config.logging.max_log_entries),
            status: ConnectionStatus::default(),
            stats: SessionStats::default(),
            last_error: None,
            pending_redraw: Redraw::None,
            window_resets: 0,
            shutdown: false,
        }
    }

    /// Apply one backend message
    pub fn apply(&mut self, msg: BackendMessage) {
        match msg {
            BackendMessage::ConnectionStatus(status) => {
                if status.is_connected() {
                    self.last_error = None;
                }
                self.status = status;
            }
            BackendMessage::ConnectionError(error) => {
                self.last_error = Some(error);
            }
            BackendMessage::Sample { value, received_at } => {
                let outcome = self.window.insert(value, received_at);
                self.bounds.fit(self.window.value_range());
                match outcome {
                    InsertOutcome::Rolled => {
                        self.window_resets += 1;
                        self.pending_redraw.escalate(Redraw::Full);
                    }
                    InsertOutcome::Appended { evicted } if evicted > 0 => {
                        self.pending_redraw.escalate(Redraw::Full)
                    }
                    InsertOutcome::Appended { .. } => self.pending_redraw.escalate(Redraw::Append),
                }
            }
            BackendMessage::Line { text, received_at } => {
                self.log.push(LogEntry::at(received_at, text));
            }
            BackendMessage::Stats(stats) => {
                self.stats = stats;
            }
            BackendMessage::Shutdown => {
                self.shutdown = true;
            }
        }
    }

    /// Advance the rollover timer.
    ///
    /// Returns true when the window rolled and the plot was cleared. The
    /// axis keeps its last fitted bounds until new samples arrive.
    pub fn tick(&mut self, now: Instant) -> bool {
        let rolled = self.window.tick(now);
        if rolled {
            self.window_resets += 1;
            self.pending_redraw.escalate(Redraw::Full);
        }
        rolled
    }

    /// Take the pending redraw level, resetting it to `None`
    pub fn take_redraw(&mut self) -> Redraw {
        std::mem::take(&mut self.pending_redraw)
    }

    /// Whether the backend has announced shutdown
    pub fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    /// Current connection status
    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    /// Most recent connection-level error, if any
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The sliding sample window
    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    /// Current axis bounds
    pub fn bounds(&self) -> AxisBounds {
        self.bounds
    }

    /// The scrolling log
    pub fn log(&self) -> &LogBuffer {
        &self.log
    }

    /// Latest statistics snapshot
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Times the window rolled over since startup
    pub fn window_resets(&self) -> u64 {
        self.window_resets
    }

    /// Plot points as `[offset_minutes, value]` pairs
    pub fn plot_points(&self) -> Vec<[f64; 2]> {
        self.window.as_plot_points()
    }

    /// One-screen textual summary: status, plot shape, and the log tail
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "status: {}", self.status);
        if let Some(error) = &self.last_error {
            let _ = writeln!(out, "last error: {}", error);
        }
        let _ = writeln!(
            out,
            "samples: {} | resets: {} | axis: [{:.2}, {:.2}] | parse rate: {:.1}% | skipped: {}",
            self.window.len(),
            self.window_resets,
            self.bounds.min,
            self.bounds.max,
            self.stats.parse_rate(),
            self.stats.skipped_lines()
        );
        if let Some(latest) = self.window.latest() {
            let _ = writeln!(
                out,
                "latest: {:.3} at {:.2} min",
                latest.value, latest.offset_minutes
            );
        }

        let tail_start = self.log.len().saturating_sub(5);
        for entry in self.log.iter().skip(tail_start) {
            let _ = writeln!(out, "{}", entry.formatted());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use std::time::Duration;

    fn minutes(m: f64) -> Duration {
        Duration::from_secs_f64(m * 60.0)
    }

    fn sample(value: f64, at: Instant) -> BackendMessage {
        BackendMessage::Sample {
            value,
            received_at: at,
        }
    }

    fn line(text: &str) -> BackendMessage {
        BackendMessage::Line {
            text: text.to_string(),
            received_at: Local::now(),
        }
    }

    fn test_state() -> (ViewState, Instant) {
        let start = Instant::now();
        (ViewState::with_window_start(&Config::default(), start), start)
    }

    #[test]
    fn test_samples_reach_window_and_axis() {
        let (mut state, start) = test_state();

        state.apply(sample(1.0, start));
        state.apply(sample(1.0, start + minutes(1.0)));
        state.apply(sample(1.0, start + minutes(2.0)));

        assert_eq!(state.window().len(), 3);
        // Flat data pads by a whole unit either side
        let bounds = state.bounds();
        assert!((bounds.min - 0.0).abs() < 1e-9);
        assert!((bounds.max - 2.0).abs() < 1e-9);
        assert_eq!(state.take_redraw(), Redraw::Append);
    }

    #[test]
    fn test_axis_pads_by_ratio() {
        let (mut state, start) = test_state();

        state.apply(sample(0.0, start));
        state.apply(sample(10.0, start + minutes(0.5)));

        let bounds = state.bounds();
        assert!((bounds.min - (-1.0)).abs() < 1e-9);
        assert!((bounds.max - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_rollover_requests_full_redraw() {
        let (mut state, start) = test_state();

        state.apply(sample(5.0, start + minutes(10.0)));
        assert_eq!(state.take_redraw(), Redraw::Append);
        assert_eq!(state.window_resets(), 0);

        state.apply(sample(6.0, start + minutes(25.1)));
        assert_eq!(state.window().len(), 1);
        assert_eq!(state.take_redraw(), Redraw::Full);
        assert_eq!(state.window_resets(), 1);
    }

    #[test]
    fn test_tick_rolls_empty_window() {
        let (mut state, start) = test_state();

        state.apply(sample(3.0, start + minutes(1.0)));
        let before = state.bounds();

        assert!(state.tick(start + minutes(25.0)));
        assert!(state.window().is_empty());
        assert_eq!(state.take_redraw(), Redraw::Full);
        assert_eq!(state.window_resets(), 1);
        // Axis holds its last fit until new samples arrive
        assert_eq!(state.bounds(), before);

        assert!(!state.tick(start + minutes(26.0)));
    }

    #[test]
    fn test_lines_fill_log_up_to_capacity() {
        let (mut state, _) = test_state();

        for i in 0..150 {
            state.apply(line(&format!("reading {}", i)));
        }

        assert_eq!(state.log().len(), 100);
        let first = state.log().iter().next().unwrap();
        assert!(first.text.contains("reading 50"));
    }

    #[test]
    fn test_status_and_error_tracking() {
        let (mut state, _) = test_state();

        state.apply(BackendMessage::ConnectionError("boom".to_string()));
        state.apply(BackendMessage::ConnectionStatus(ConnectionStatus::Failed(
            "boom".to_string(),
        )));
        assert_eq!(state.last_error(), Some("boom"));

        state.apply(BackendMessage::ConnectionStatus(
            ConnectionStatus::Connected("/dev/ttyA".to_string()),
        ));
        assert!(state.status().is_connected());
        // A successful connection clears the stale error
        assert_eq!(state.last_error(), None);
    }

    #[test]
    fn test_stats_snapshot_is_replaced() {
        let (mut state, _) = test_state();

        let mut stats = SessionStats::default();
        stats.lines_received = 42;
        state.apply(BackendMessage::Stats(stats));

        assert_eq!(state.stats().lines_received, 42);
    }

    #[test]
    fn test_shutdown_flag() {
        let (mut state, _) = test_state();
        assert!(!state.is_shutdown());
        state.apply(BackendMessage::Shutdown);
        assert!(state.is_shutdown());
    }

    #[test]
    fn test_redraw_take_resets() {
        let (mut state, start) = test_state();

        state.apply(sample(1.0, start));
        assert_eq!(state.take_redraw(), Redraw::Append);
        assert_eq!(state.take_redraw(), Redraw::None);
    }

    #[test]
    fn test_render_summary_mentions_status_and_log() {
        let (mut state, start) = test_state();

        state.apply(BackendMessage::ConnectionStatus(
            ConnectionStatus::Connected("/dev/ttyA".to_string()),
        ));
        state.apply(sample(23.5, start));
        state.apply(line("23.5"));

        let summary = state.render_summary();
        assert!(summary.contains("Connected to /dev/ttyA"));
        assert!(summary.contains("23.5"));
    }
}
