//! # SerialVis-RS: Serial Telemetry Viewer
//!
//! A desktop tool that reads numeric readings from a serial device, one
//! value per line, and presents them as a sliding time-window plot next to
//! a scrolling log of the raw lines. The serial reading backend runs in its
//! own thread and never touches presentation state.
//!
//! ## Architecture
//!
//! - **Backend**: Owns the serial port and pumps lines in a worker thread
//! - **Parser**: Turns trimmed lines into values, or classifies the rejects
//! - **Window**: Sliding 25-minute sample buffer with automatic rollover
//! - **View**: Single consumer of backend messages; owns plot, axis, and log
//! - **Communication**: Crossbeam channels for thread-safe data transfer
//!
//! ## Configuration
//!
//! Configuration and application state (recent ports, preferences) are
//! stored in the platform-appropriate data directory under
//! `dev.serialvis.serialvis-rs`:
//!
//! - **Linux**: `~/.local/share/dev.serialvis.serialvis-rs/`
//! - **macOS**: `~/Library/Application Support/dev.serialvis.serialvis-rs/`
//! - **Windows**: `%APPDATA%\dev.serialvis.serialvis-rs\`
//!
//! ## Example
//!
//! ```no_run
//! use serialvis_rs::backend::SerialBackend;
//! use serialvis_rs::config::Config;
//! use serialvis_rs::view::ViewState;
//! use std::time::{Duration, Instant};
//!
//! let config = Config::load_or_default();
//! let (backend, frontend) = SerialBackend::new(config.clone());
//!
//! std::thread::spawn(move || backend.run());
//! frontend.connect();
//!
//! let mut view = ViewState::new(&config);
//! loop {
//!     for msg in frontend.drain() {
//!         view.apply(msg);
//!     }
//!     view.tick(Instant::now());
//!     if view.is_shutdown() {
//!         break;
//!     }
//!     std::thread::sleep(Duration::from_millis(100));
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod parser;
pub mod types;
pub mod view;
pub mod window;

// Re-export commonly used types
pub use backend::{BackendCommand, BackendMessage, FrontendReceiver, SerialBackend};
pub use config::{AppState, Config};
pub use error::{Result, SerialVisError};
pub use parser::{parse_line, ParseOutcome, ValueBounds};
pub use types::{AxisBounds, ConnectionStatus, LogBuffer, LogEntry, Sample, SessionStats};
pub use view::{Redraw, ViewState};
pub use window::{InsertOutcome, TimeWindow};
