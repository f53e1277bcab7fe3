//! Mock Transport Implementation for Testing
//!
//! This module provides a mock line transport that can be used for
//! testing the application without real hardware. It emits lines either
//! from a fixed script or from a configurable generator pattern.
//!
//! # Line Patterns
//!
//! - [`MockLinePattern::Constant`] - Fixed value (useful for testing flat-axis handling)
//! - [`MockLinePattern::Sine`] - Sinusoidal wave with configurable frequency/amplitude
//! - [`MockLinePattern::Counter`] - Incrementing counter with wrap-around
//! - [`MockLinePattern::Random`] - Random values within a range
//!
//! A scripted transport plays back exact lines instead, which is what
//! most tests want:
//!
//! ```ignore
//! use serialvis_rs::backend::mock::MockTransport;
//!
//! let transport = MockTransport::new()
//!     .with_script(["23.5", "24.0", "N/A", "24.5"])
//!     .with_eof_after_script(true);
//! ```
//!
//! # Enabling
//!
//! The mock transport is available in unit tests and behind the
//! `mock-serial` feature:
//!
//! ```bash
//! cargo test --features mock-serial
//! ```

use crate::backend::transport::{LineTransport, ReadOutcome, TransportStats};
use crate::error::{Result, SerialVisError};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Default pacing between generated lines
const DEFAULT_LINE_INTERVAL: Duration = Duration::from_millis(100);

/// Pattern for generating mock lines
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockLinePattern {
    /// Constant value
    Constant(f64),
    /// Sine wave with frequency and amplitude
    Sine {
        frequency: f64,
        amplitude: f64,
        offset: f64,
    },
    /// Counter that increments
    Counter { step: f64, min: f64, max: f64 },
    /// Random values within range
    Random { min: f64, max: f64 },
}

impl Default for MockLinePattern {
    fn default() -> Self {
        MockLinePattern::Sine {
            frequency: 0.1,
            amplitude: 10.0,
            offset: 20.0,
        }
    }
}

impl MockLinePattern {
    /// Generate a value for the given elapsed time
    fn generate(&self, elapsed_secs: f64, counter: &mut f64) -> f64 {
        match *self {
            MockLinePattern::Constant(v) => v,
            MockLinePattern::Sine {
                frequency,
                amplitude,
                offset,
            } => offset + amplitude * (2.0 * std::f64::consts::PI * frequency * elapsed_secs).sin(),
            MockLinePattern::Counter { step, min, max } => {
                *counter += step;
                if *counter > max {
                    *counter = min;
                } else if *counter < min {
                    *counter = max;
                }
                *counter
            }
            MockLinePattern::Random { min, max } => min + rand_simple() * (max - min),
        }
    }
}

/// Simple pseudo-random number generator (no external dependency)
fn rand_simple() -> f64 {
    use std::cell::Cell;
    thread_local! {
        static SEED: Cell<u64> = Cell::new(54321);
    }
    SEED.with(|seed| {
        let mut s = seed.get();
        s ^= s << 13;
        s ^= s >> 7;
        s ^= s << 17;
        seed.set(s);
        (s as f64) / (u64::MAX as f64)
    })
}

/// Mock transport for testing without real hardware
pub struct MockTransport {
    /// Whether the mock port is "open"
    open: bool,
    /// Name given to `open`
    port_name: Option<String>,
    /// Port names returned by enumeration
    ports: Vec<String>,
    /// Scripted lines played back before the generator takes over
    script: VecDeque<String>,
    /// Report end-of-stream once the script is exhausted
    eof_after_script: bool,
    /// Fail the next `open` call (simulates a busy or vanished port)
    fail_open: bool,
    /// Pattern used once the script is exhausted
    pattern: MockLinePattern,
    /// Noise amplitude added to generated values (0.0 = no noise)
    noise_amplitude: f64,
    /// Inject a "N/A" line every Nth generated line
    malformed_every: Option<u64>,
    /// Pacing between generated lines
    line_interval: Duration,
    /// Read timeout captured from `open`
    read_timeout: Duration,
    /// Start time for pattern generation
    start_time: Instant,
    /// Time the previous generated line was emitted
    last_line_at: Option<Instant>,
    /// Running counter for the Counter pattern
    counter_value: f64,
    /// Total generated lines, used for malformed injection cadence
    lines_emitted: u64,
    /// Transport statistics
    stats: TransportStats,
}

impl MockTransport {
    /// Create a mock transport with one fake port and the default pattern
    pub fn new() -> Self {
        Self {
            open: false,
            port_name: None,
            ports: vec!["/dev/mock0".to_string()],
            script: VecDeque::new(),
            eof_after_script: false,
            fail_open: false,
            pattern: MockLinePattern::default(),
            noise_amplitude: 0.0,
            malformed_every: None,
            line_interval: DEFAULT_LINE_INTERVAL,
            read_timeout: Duration::from_millis(100),
            start_time: Instant::now(),
            last_line_at: None,
            counter_value: 0.0,
            lines_emitted: 0,
            stats: TransportStats::default(),
        }
    }

    /// Set the port names enumeration will report.
    /// An empty list simulates a machine with no serial ports.
    pub fn with_ports(mut self, ports: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ports = ports.into_iter().map(Into::into).collect();
        self
    }

    /// Queue exact lines to play back, one per read
    pub fn with_script(mut self, lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.script = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Report end-of-stream once the script is exhausted
    pub fn with_eof_after_script(mut self, eof: bool) -> Self {
        self.eof_after_script = eof;
        self
    }

    /// Make the next `open` call fail
    pub fn with_open_failure(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Set the generator pattern used after the script
    pub fn with_pattern(mut self, pattern: MockLinePattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// Add noise to generated values
    pub fn with_noise(mut self, amplitude: f64) -> Self {
        self.noise_amplitude = amplitude;
        self
    }

    /// Emit a "N/A" line every Nth generated line
    pub fn with_malformed_every(mut self, every: u64) -> Self {
        self.malformed_every = Some(every.max(1));
        self
    }

    /// Pace generated lines at the given interval
    pub fn with_line_interval(mut self, interval: Duration) -> Self {
        self.line_interval = interval;
        self
    }

    fn generate_line(&mut self) -> String {
        self.lines_emitted += 1;
        if let Some(every) = self.malformed_every {
            if self.lines_emitted % every == 0 {
                return "N/A".to_string();
            }
        }

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let mut value = self.pattern.generate(elapsed, &mut self.counter_value);
        if self.noise_amplitude > 0.0 {
            value += (rand_simple() - 0.5) * 2.0 * self.noise_amplitude;
        }
        format!("{:.2}", value)
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl LineTransport for MockTransport {
    fn list_ports(&self) -> Result<Vec<String>> {
        Ok(self.ports.clone())
    }

    fn open(&mut self, port_name: &str, _baud_rate: u32, read_timeout: Duration) -> Result<()> {
        if self.fail_open {
            self.fail_open = false;
            return Err(serialport::Error::new(
                serialport::ErrorKind::NoDevice,
                format!("mock open failure for {}", port_name),
            )
            .into());
        }

        self.open = true;
        self.port_name = Some(port_name.to_string());
        self.read_timeout = read_timeout;
        self.start_time = Instant::now();
        self.last_line_at = None;
        tracing::info!("Mock transport opened {}", port_name);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    fn read_line(&mut self) -> Result<ReadOutcome> {
        if !self.open {
            return Err(SerialVisError::Disconnected("port not open".to_string()));
        }

        if let Some(line) = self.script.pop_front() {
            return Ok(ReadOutcome::Line(line));
        }
        if self.eof_after_script {
            return Ok(ReadOutcome::Eof);
        }

        // Honor pacing the way a blocking read would: wait for the next
        // line if it is due within the timeout, otherwise time out.
        if !self.line_interval.is_zero() {
            if let Some(last) = self.last_line_at {
                let due = last + self.line_interval;
                let now = Instant::now();
                if due > now {
                    let wait = due - now;
                    if wait > self.read_timeout {
                        std::thread::sleep(self.read_timeout);
                        return Ok(ReadOutcome::TimedOut);
                    }
                    std::thread::sleep(wait);
                }
            }
        }

        self.last_line_at = Some(Instant::now());
        Ok(ReadOutcome::Line(self.generate_line()))
    }

    fn discard_input(&mut self) -> Result<()> {
        if !self.open {
            return Err(SerialVisError::Disconnected("port not open".to_string()));
        }
        // Scripted lines model what the device sends after stabilization,
        // so a discard leaves them in place
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
        self.port_name = None;
        tracing::info!("Mock transport closed");
    }

    fn stats(&self) -> &TransportStats {
        &self.stats
    }

    fn stats_mut(&mut self) -> &mut TransportStats {
        &mut self.stats
    }
}
