//! Tests for utility functions

use prometheus_triage::util::{init_tracing, now_ms, Clock, ManualClock, SystemClock};

#[test]
fn test_system_clock_tracks_now() {
    let before = now_ms();
    let read = SystemClock.now_ms();
    assert!(read >= before);
    assert!(read > 1_600_000_000_000);
}

#[test]
fn test_manual_clock_advance_and_set() {
    let clock = ManualClock::new(1_000);
    assert_eq!(clock.now_ms(), 1_000);
    clock.advance(250);
    assert_eq!(clock.now_ms(), 1_250);
    clock.set(5);
    assert_eq!(clock.now_ms(), 5);
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
    tracing::info!("tracing initialized twice without panicking");
}
