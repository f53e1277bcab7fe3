//! Serial Telemetry Viewer - Main Entry Point
//!
//! Console host for the serial reading backend. Connects to the device,
//! applies backend messages to the presentation state, and prints a
//! periodic summary of the plot and the log tail.

use anyhow::Context;
use crossbeam_channel::RecvTimeoutError;
use serialvis_rs::backend::{BackendMessage, SerialBackend};
use serialvis_rs::config::{AppState, Config};
use serialvis_rs::types::ConnectionStatus;
use serialvis_rs::view::ViewState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How long to block waiting for backend messages per loop iteration
const DRAIN_INTERVAL: Duration = Duration::from_millis(100);

/// How often the textual summary is printed
const SUMMARY_INTERVAL: Duration = Duration::from_secs(5);

fn main() -> anyhow::Result<()> {
    let config = Config::load_or_default();

    // Initialize logging
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,serialvis_rs=debug"));
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer());

    // The guard must outlive main so buffered log lines get flushed
    let _file_guard = if config.logging.log_to_file {
        match serialvis_rs::config::ensure_app_data_dir() {
            Ok(dir) => {
                let appender = tracing_appender::rolling::daily(dir, "serialvis.log");
                let (writer, guard) = tracing_appender::non_blocking(appender);
                registry
                    .with(
                        tracing_subscriber::fmt::layer()
                            .with_writer(writer)
                            .with_ansi(false),
                    )
                    .init();
                Some(guard)
            }
            Err(e) => {
                registry.init();
                tracing::warn!("File logging disabled: {}", e);
                None
            }
        }
    } else {
        registry.init();
        None
    };

    tracing::info!("Starting Serial Telemetry Viewer");

    let mut app_state = AppState::load_or_default();

    let (backend, frontend) = SerialBackend::new(config.clone());
    let stop = backend.stop_handle();
    let backend_handle = std::thread::spawn(move || backend.run());

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = interrupted.clone();
        ctrlc::set_handler(move || {
            interrupted.store(true, Ordering::SeqCst);
        })
        .context("installing Ctrl-C handler")?;
    }

    frontend.connect();

    let mut view = ViewState::new(&config);
    let mut last_summary = Instant::now();

    while !view.is_shutdown() {
        if interrupted.swap(false, Ordering::SeqCst) {
            tracing::info!("Interrupted, shutting down");
            frontend.shutdown();
        }

        match frontend.receiver.recv_timeout(DRAIN_INTERVAL) {
            Ok(msg) => {
                apply_message(&mut view, &mut app_state, msg);
                for msg in frontend.drain() {
                    apply_message(&mut view, &mut app_state, msg);
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        view.tick(Instant::now());

        if last_summary.elapsed() >= SUMMARY_INTERVAL {
            print!("{}", view.render_summary());
            last_summary = Instant::now();
        }
    }

    stop.store(false, Ordering::SeqCst);
    if backend_handle.join().is_err() {
        tracing::error!("Backend worker panicked");
    }

    if let Err(e) = app_state.save() {
        tracing::warn!("Failed to save application state: {}", e);
    }

    tracing::info!("Shutting down");
    Ok(())
}

/// Apply one backend message, recording successful connections
fn apply_message(view: &mut ViewState, app_state: &mut AppState, msg: BackendMessage) {
    if let BackendMessage::ConnectionStatus(status) = &msg {
        if let ConnectionStatus::Connected(port) = status {
            app_state.add_recent_port(port.clone());
        }
        if status.is_terminal() {
            tracing::warn!("Session over: {}", status);
        }
    }
    view.apply(msg);
}
