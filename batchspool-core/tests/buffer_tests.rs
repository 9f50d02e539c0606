use batchspool_core::buffer::BufferState;
use batchspool_core::config::CycleConfig;
use std::time::Duration;
use tokio::time::Instant;

fn config(delay_ms: u64, threshold: usize) -> CycleConfig {
    CycleConfig::new(Duration::from_millis(delay_ms), threshold).expect("valid config")
}

#[test]
fn new_buffer_is_empty_with_no_deadline() {
    let buffer: BufferState<u32> = BufferState::new(config(100, 5));
    assert!(buffer.is_empty());
    assert_eq!(buffer.pending_count(), 0);
    assert_eq!(buffer.release_deadline(), None);
}

#[test]
fn push_counts_and_stamps_activity() {
    let mut buffer = BufferState::new(config(100, 5));
    let now = Instant::now();
    assert_eq!(buffer.push(1u32, now), 1);
    assert_eq!(buffer.push(2, now), 2);
    assert_eq!(buffer.release_deadline(), Some(now + Duration::from_millis(100)));
}

#[test]
fn later_push_rearms_the_deadline() {
    let mut buffer = BufferState::new(config(100, 5));
    let t0 = Instant::now();
    buffer.push(1u32, t0);
    let t1 = t0 + Duration::from_millis(60);
    buffer.push(2, t1);
    assert_eq!(buffer.release_deadline(), Some(t1 + Duration::from_millis(100)));
}

#[test]
fn take_pending_returns_arrival_order_and_clears() {
    let mut buffer = BufferState::new(config(100, 5));
    let now = Instant::now();
    for v in [3u32, 1, 2] {
        buffer.push(v, now);
    }
    assert_eq!(buffer.take_pending(), vec![3, 1, 2]);
    assert!(buffer.is_empty());
    assert_eq!(buffer.release_deadline(), None);
}

#[test]
fn count_threshold_checks_the_frozen_config() {
    let mut buffer = BufferState::new(config(100, 3));
    let now = Instant::now();
    buffer.push(1u32, now);
    buffer.push(2, now);
    assert!(!buffer.count_threshold_reached());
    buffer.push(3, now);
    assert!(buffer.count_threshold_reached());
}

#[test]
fn eta_is_full_delay_while_empty() {
    let buffer: BufferState<u32> = BufferState::new(config(250, 5));
    assert_eq!(
        buffer.time_until_release(Instant::now()),
        Duration::from_millis(250)
    );
}

#[test]
fn eta_counts_down_and_saturates_at_zero() {
    let mut buffer = BufferState::new(config(100, 5));
    let t0 = Instant::now();
    buffer.push(1u32, t0);
    assert_eq!(
        buffer.time_until_release(t0 + Duration::from_millis(30)),
        Duration::from_millis(70)
    );
    assert_eq!(
        buffer.time_until_release(t0 + Duration::from_millis(500)),
        Duration::ZERO
    );
}

#[test]
fn open_cycle_swaps_in_the_staged_config() {
    let mut buffer = BufferState::new(config(100, 5));
    buffer.push(1u32, Instant::now());
    buffer.take_pending();
    buffer.open_cycle(config(400, 2));
    assert_eq!(buffer.config().inactivity_delay, Duration::from_millis(400));
    assert_eq!(buffer.config().count_threshold, 2);
    assert_eq!(buffer.release_deadline(), None);
}
