//! Integration tests for backend lifecycle
//!
//! These tests validate the complete backend workflow against a mock
//! device: connection, line flow, session failure, and shutdown.

#![cfg(feature = "mock-serial")]

mod common;

use serialvis_rs::backend::{BackendMessage, MockTransport, SerialBackend};
use serialvis_rs::config::Config;
use serialvis_rs::types::ConnectionStatus;
use std::thread;
use std::time::Duration;

fn test_config() -> Config {
    let mut config = Config::default();
    config.connection.stabilize_delay_ms = 0;
    config
}

#[test]
fn test_backend_creation_and_shutdown() {
    let (backend, frontend) =
        SerialBackend::with_transport(test_config(), Box::new(MockTransport::new()));

    // Spawn backend thread
    let handle = thread::spawn(move || backend.run());

    // Give it a moment to initialize
    thread::sleep(Duration::from_millis(50));

    // Shutdown
    frontend.shutdown();

    // Backend should exit cleanly and announce it
    let result = handle.join();
    assert!(result.is_ok(), "Backend thread should exit cleanly");

    let messages = frontend.drain();
    assert!(
        messages
            .iter()
            .any(|msg| matches!(msg, BackendMessage::Shutdown)),
        "Should receive shutdown message"
    );
}

#[test]
fn test_connect_delivers_samples_and_lines() {
    let transport = MockTransport::new().with_script(["23.5", "24.0", "N/A"]);
    let (backend, frontend) = SerialBackend::with_transport(test_config(), Box::new(transport));

    let handle = thread::spawn(move || backend.run());

    frontend.connect();
    thread::sleep(Duration::from_millis(200));

    let messages = frontend.drain();

    let connected = messages.iter().any(|msg| {
        matches!(
            msg,
            BackendMessage::ConnectionStatus(ConnectionStatus::Connected(_))
        )
    });
    assert!(connected, "Should reach connected status");

    let samples: Vec<f64> = messages
        .iter()
        .filter_map(|msg| match msg {
            BackendMessage::Sample { value, .. } => Some(*value),
            _ => None,
        })
        .collect();
    assert!(samples.contains(&23.5), "Should parse 23.5");
    assert!(samples.contains(&24.0), "Should parse 24.0");

    // The malformed line never becomes a sample but still reaches the log
    let lines: Vec<&str> = messages
        .iter()
        .filter_map(|msg| match msg {
            BackendMessage::Line { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert!(lines.contains(&"N/A"), "Raw line should reach the log");

    frontend.shutdown();
    handle.join().unwrap();
}

#[test]
fn test_session_ends_on_eof() {
    let transport = MockTransport::new()
        .with_script(["1.0"])
        .with_eof_after_script(true);
    let (backend, frontend) = SerialBackend::with_transport(test_config(), Box::new(transport));

    let handle = thread::spawn(move || backend.run());

    frontend.connect();
    thread::sleep(Duration::from_millis(200));

    let messages = frontend.drain();
    assert!(
        messages.iter().any(|msg| {
            matches!(
                msg,
                BackendMessage::ConnectionStatus(ConnectionStatus::Failed(_))
            )
        }),
        "EOF should end the session as failed"
    );
    assert!(
        messages
            .iter()
            .any(|msg| matches!(msg, BackendMessage::ConnectionError(_))),
        "EOF should produce a connection error"
    );

    frontend.shutdown();
    handle.join().unwrap();
}

#[test]
fn test_no_ports_is_reported() {
    let transport = MockTransport::new().with_ports(Vec::<String>::new());
    let (backend, frontend) = SerialBackend::with_transport(test_config(), Box::new(transport));

    let handle = thread::spawn(move || backend.run());

    frontend.connect();
    thread::sleep(Duration::from_millis(100));

    let messages = frontend.drain();
    assert!(
        messages.iter().any(|msg| {
            matches!(
                msg,
                BackendMessage::ConnectionStatus(ConnectionStatus::NoPortsFound)
            )
        }),
        "Should report that no ports were found"
    );

    frontend.shutdown();
    handle.join().unwrap();
}

#[test]
fn test_stats_reporting() {
    let (backend, frontend) =
        SerialBackend::with_transport(test_config(), Box::new(MockTransport::new()));

    let handle = thread::spawn(move || backend.run());

    frontend.connect();
    thread::sleep(Duration::from_millis(300));

    // A pump iteration can block for a full read timeout before the
    // command is seen, so leave room for two iterations.
    frontend.request_stats();
    thread::sleep(Duration::from_millis(250));

    let messages = frontend.drain();
    let stats = messages.iter().rev().find_map(|msg| match msg {
        BackendMessage::Stats(stats) => Some(stats.clone()),
        _ => None,
    });

    let stats = stats.expect("Should receive statistics updates");
    assert!(stats.lines_received > 0, "Mock should have produced lines");

    frontend.shutdown();
    handle.join().unwrap();
}

#[test]
fn test_disconnect_returns_to_not_connected() {
    let (backend, frontend) =
        SerialBackend::with_transport(test_config(), Box::new(MockTransport::new()));

    let handle = thread::spawn(move || backend.run());

    frontend.connect();
    thread::sleep(Duration::from_millis(100));

    frontend.disconnect();
    thread::sleep(Duration::from_millis(100));

    let messages = frontend.drain();
    assert!(
        messages.iter().any(|msg| {
            matches!(
                msg,
                BackendMessage::ConnectionStatus(ConnectionStatus::NotConnected)
            )
        }),
        "Should return to not connected"
    );

    frontend.shutdown();
    handle.join().unwrap();
}

#[test]
fn test_use_mock_transport_toggle() {
    // Start over the real transport, then swap to the mock by command
    let (backend, frontend) = SerialBackend::new(test_config());

    let handle = thread::spawn(move || backend.run());

    frontend.use_mock_transport(true);
    thread::sleep(Duration::from_millis(50));

    frontend.connect();
    thread::sleep(Duration::from_millis(300));

    let messages = frontend.drain();
    let connected_to_mock = messages.iter().any(|msg| {
        matches!(
            msg,
            BackendMessage::ConnectionStatus(ConnectionStatus::Connected(name))
                if name == "/dev/mock0"
        )
    });
    assert!(connected_to_mock, "Should connect to the mock port");

    frontend.disconnect();
    thread::sleep(Duration::from_millis(50));
    frontend.shutdown();
    handle.join().unwrap();
}
