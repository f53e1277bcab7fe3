//! Sliding time-window storage for plotted samples
//!
//! The window holds samples positioned by their offset in minutes from
//! the window start. Every retained sample satisfies
//! `0 <= offset_minutes < duration_minutes`.
//!
//! A window rolls over in two ways:
//! - An arriving sample whose offset would reach the duration resets the
//!   window first and lands at offset 0 of the fresh window.
//! - [`TimeWindow::tick`] resets on a wall-clock schedule so stale data
//!   cannot outlive the window when no samples arrive near the boundary.

use crate::types::Sample;
use std::collections::VecDeque;
use std::time::Instant;

/// What an insertion did to the retained sample set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The sample was appended to the current window
    Appended {
        /// Number of samples evicted past the trailing cutoff
        evicted: usize,
    },
    /// The offset reached the window duration, so the window was reset
    /// and the sample opened a fresh one at offset 0
    Rolled,
}

/// Time-ordered sample storage bounded to a fixed duration
#[derive(Debug)]
pub struct TimeWindow {
    samples: VecDeque<Sample>,
    window_start: Instant,
    duration_minutes: f64,
}

impl TimeWindow {
    /// Create a window starting now
    pub fn new(duration_minutes: f64) -> Self {
        Self::starting_at(Instant::now(), duration_minutes)
    }

    /// Create a window with an explicit start instant
    pub fn starting_at(window_start: Instant, duration_minutes: f64) -> Self {
        Self {
            samples: VecDeque::new(),
            window_start,
            duration_minutes,
        }
    }

    /// The configured window duration in minutes
    pub fn duration_minutes(&self) -> f64 {
        self.duration_minutes
    }

    /// The instant the current window began
    pub fn window_start(&self) -> Instant {
        self.window_start
    }

    /// Minutes elapsed from the window start to `now`.
    ///
    /// Saturates at zero when `now` precedes the window start.
    pub fn offset_of(&self, now: Instant) -> f64 {
        now.duration_since(self.window_start).as_secs_f64() / 60.0
    }

    /// Insert a value observed at `now`.
    ///
    /// Rolls the window over first when the offset has reached the
    /// duration. After appending, samples behind the trailing cutoff
    /// (`offset - duration`) are evicted from the front. Within a single
    /// window the cutoff stays at zero and removes nothing; the pass is
    /// kept so a stepped clock cannot strand stale samples.
    pub fn insert(&mut self, value: f64, now: Instant) -> InsertOutcome {
        let mut offset = self.offset_of(now);
        let rolled = offset >= self.duration_minutes;
        if rolled {
            self.reset(now);
            offset = 0.0;
        }

        self.samples.push_back(Sample::new(offset, value));

        let cutoff = (offset - self.duration_minutes).max(0.0);
        let evicted = self.evict_before(cutoff);

        if rolled {
            InsertOutcome::Rolled
        } else {
            InsertOutcome::Appended { evicted }
        }
    }

    /// Start a fresh window at `now`, discarding all samples
    pub fn reset(&mut self, now: Instant) {
        self.window_start = now;
        self.samples.clear();
    }

    /// Roll the window over if its duration has elapsed.
    ///
    /// Returns true when a reset happened, so the caller can trigger a
    /// full redraw. Called on a timer independent of sample arrival.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.offset_of(now) >= self.duration_minutes {
            self.reset(now);
            true
        } else {
            false
        }
    }

    /// Remove leading samples older than the cutoff offset
    fn evict_before(&mut self, cutoff: f64) -> usize {
        let mut evicted = 0;
        while let Some(front) = self.samples.front() {
            if front.offset_minutes < cutoff {
                self.samples.pop_front();
                evicted += 1;
            } else {
                break;
            }
        }
        evicted
    }

    /// Minimum and maximum of the retained values
    pub fn value_range(&self) -> Option<(f64, f64)> {
        if self.samples.is_empty() {
            return None;
        }
        let mut min = f64::MAX;
        let mut max = f64::MIN;
        for sample in &self.samples {
            min = min.min(sample.value);
            max = max.max(sample.value);
        }
        Some((min, max))
    }

    /// Samples as plot points (offset in minutes, value)
    pub fn as_plot_points(&self) -> Vec<[f64; 2]> {
        self.samples
            .iter()
            .map(|s| [s.offset_minutes, s.value])
            .collect()
    }

    /// Iterate retained samples from oldest to newest
    pub fn samples(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// The most recently appended sample
    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Number of retained samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the window holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
