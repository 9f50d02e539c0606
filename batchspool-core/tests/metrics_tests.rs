use batchspool_core::metrics::MetricsTracker;

#[test]
fn fresh_tracker_reads_zero() {
    let tracker = MetricsTracker::new();
    let m = tracker.snapshot();
    assert_eq!(m.total_events_processed, 0);
    assert_eq!(m.total_batches_sent, 0);
    assert_eq!(m.running_average_batch_size, 0.0);
    assert!(!m.is_processing_batch);
}

#[test]
fn first_batch_sets_the_average_directly() {
    let tracker = MetricsTracker::new();
    tracker.record_batch(7);
    let m = tracker.snapshot();
    assert_eq!(m.total_batches_sent, 1);
    assert_eq!(m.total_events_processed, 7);
    assert_eq!(m.running_average_batch_size, 7.0);
}

#[test]
fn running_average_over_batch_sizes() {
    let tracker = MetricsTracker::new();
    for size in [4, 6, 10] {
        tracker.record_batch(size);
    }
    let m = tracker.snapshot();
    assert_eq!(m.total_events_processed, 20);
    assert_eq!(m.total_batches_sent, 3);
    assert!((m.running_average_batch_size - 20.0 / 3.0).abs() < 1e-9);
}

#[test]
fn processing_flag_toggles() {
    let tracker = MetricsTracker::new();
    tracker.set_processing(true);
    assert!(tracker.snapshot().is_processing_batch);
    tracker.set_processing(false);
    assert!(!tracker.snapshot().is_processing_batch);
}

#[test]
fn snapshot_is_detached_from_later_updates() {
    let tracker = MetricsTracker::new();
    tracker.record_batch(5);
    let before = tracker.snapshot();
    tracker.record_batch(9);
    assert_eq!(before.total_batches_sent, 1);
    assert_eq!(tracker.snapshot().total_batches_sent, 2);
}
