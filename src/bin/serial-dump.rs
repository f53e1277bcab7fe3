//! Dump raw serial output to stdout.
//!
//! Diagnostic helper: picks a port the same way the viewer does, opens it
//! at the configured baud rate, and echoes every line until Ctrl-C.

use serialvis_rs::backend::{LineTransport, ReadOutcome, SerialTransport};
use serialvis_rs::config::Config;
use std::process::exit;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn main() {
    let config = Config::load_or_default();
    let mut transport = SerialTransport::new();

    let ports = match transport.list_ports() {
        Ok(ports) => ports,
        Err(e) => {
            eprintln!("Failed to enumerate serial ports: {}", e);
            exit(1);
        }
    };

    if ports.is_empty() {
        eprintln!("No serial ports found");
        exit(1);
    }

    println!("Available serial ports:");
    for port in &ports {
        println!("  - {}", port);
    }

    // An explicit argument wins, then the configured port, then the first one
    let port_name = match std::env::args().nth(1) {
        Some(name) => name,
        None => {
            let preferred = config.connection.preferred_port.clone();
            if ports.iter().any(|p| *p == preferred) {
                preferred
            } else {
                eprintln!("Preferred port {} not found, using {}", preferred, ports[0]);
                ports[0].clone()
            }
        }
    };

    let timeout = Duration::from_millis(config.connection.read_timeout_ms);
    if let Err(e) = transport.open(&port_name, config.connection.baud_rate, timeout) {
        eprintln!("Unable to open {}: {}", port_name, e);
        eprintln!("On Linux, make sure your user is in the dialout (or uucp) group.");
        exit(1);
    }

    println!(
        "Listening on {} at {} baud, Ctrl-C to stop",
        port_name, config.connection.baud_rate
    );

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        if ctrlc::set_handler(move || running.store(false, Ordering::SeqCst)).is_err() {
            eprintln!("Warning: could not install Ctrl-C handler");
        }
    }

    while running.load(Ordering::SeqCst) {
        match transport.read_line() {
            Ok(ReadOutcome::Line(line)) => println!("{}", line),
            Ok(ReadOutcome::TimedOut) => {}
            Ok(ReadOutcome::Eof) => {
                eprintln!("Device closed the connection");
                break;
            }
            Err(e) => {
                eprintln!("Read error: {}", e);
                break;
            }
        }
    }

    transport.close();
    println!("Port closed.");
}
