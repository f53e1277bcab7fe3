//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

use std::time::Duration;

/// Offset expressed in minutes, as a duration
pub fn minutes(m: f64) -> Duration {
    Duration::from_secs_f64(m * 60.0)
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}
