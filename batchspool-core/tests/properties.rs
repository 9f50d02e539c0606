//! No-loss / no-duplication property over arbitrary send/flush interleavings.

use batchspool_core::{CycleConfig, NullSink, SubmitPolicy, create_engine};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Debug)]
enum Op {
    Send(u16),
    Flush,
}

fn ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            4 => any::<u16>().prop_map(Op::Send),
            1 => Just(Op::Flush),
        ],
        0..200,
    )
}

/// Runs a schedule against a live engine and returns (sent, observed) event
/// sequences, where observed is every released batch concatenated in emission
/// order plus the shutdown drain.
fn run_schedule(ops: Vec<Op>, threshold: usize) -> (Vec<u16>, Vec<u16>) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .expect("runtime");

    rt.block_on(async move {
        let config =
            CycleConfig::new(Duration::from_secs(3600), threshold).expect("valid config");
        let (handle, _failures, engine) =
            create_engine::<u16>(config, Arc::new(NullSink), SubmitPolicy::Queue);
        tokio::spawn(engine.run());
        let mut sub = handle.subscribe_batches();

        let mut sent = Vec::new();
        for op in ops {
            match op {
                Op::Send(v) => {
                    handle.send(v);
                    sent.push(v);
                }
                Op::Flush => handle.flush(),
            }
        }

        let drained = handle.shutdown().await.expect("shutdown");
        drop(handle); // last sender gone: the subscription ends after draining

        let mut observed = Vec::new();
        let mut last_seq = 0;
        while let Some(batch) = sub.recv().await {
            assert!(!batch.is_empty(), "empty batch released");
            assert_eq!(batch.seq, last_seq + 1, "emission order broken");
            last_seq = batch.seq;
            observed.extend(batch.events);
        }
        observed.extend(drained);

        (sent, observed)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_event_lands_in_exactly_one_batch(ops in ops(), threshold in 1usize..8) {
        let (sent, observed) = run_schedule(ops, threshold);
        // Order preservation makes the multiset check a plain equality.
        prop_assert_eq!(observed, sent);
    }
}
