//! Concurrent captures: token isolation and registry drain.

use failguard_test_utils::{logging_engine, EventCounter};
use std::fmt;
use std::sync::Arc;
use std::thread;

#[derive(Debug)]
struct WorkerFailure {
    worker: usize,
    iteration: usize,
}

impl fmt::Display for WorkerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker {} failed at iteration {}", self.worker, self.iteration)
    }
}

impl std::error::Error for WorkerFailure {}

#[test]
fn concurrent_captures_resolve_only_their_own_failure() {
    const WORKERS: usize = 8;
    const ITERATIONS: usize = 50;

    let counter = EventCounter::new();
    let engine = Arc::new(logging_engine(&counter));

    let handles: Vec<_> = (0..WORKERS)
        .map(|worker| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for iteration in 0..ITERATIONS {
                    let ops = engine.when().unwrap();
                    let chain = ops
                        .guarded_call(|| Err(WorkerFailure { worker, iteration }))
                        .on::<WorkerFailure, _>(|failure| {
                            // Each chain must dispatch on its own capture,
                            // never a neighbor's.
                            assert_eq!(failure.worker, worker);
                            assert_eq!(failure.iteration, iteration);
                        });
                    assert!(chain.result());
                    assert!(chain.handled());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker panicked");
    }

    assert!(
        engine.registry().is_empty(),
        "all chains dropped, registry drained"
    );
    assert_eq!(counter.count(), WORKERS * ITERATIONS);
}

#[test]
fn interleaved_clean_and_raising_calls_stay_consistent() {
    const WORKERS: usize = 4;
    const ITERATIONS: usize = 100;

    let counter = EventCounter::new();
    let engine = Arc::new(logging_engine(&counter));

    let handles: Vec<_> = (0..WORKERS)
        .map(|worker| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for iteration in 0..ITERATIONS {
                    let ops = engine.when().unwrap();
                    if iteration % 2 == 0 {
                        let chain = ops.guarded_call(|| Err(WorkerFailure { worker, iteration }));
                        assert!(chain.result());
                    } else {
                        let chain =
                            ops.guarded_call(|| Ok::<(), WorkerFailure>(()));
                        assert!(!chain.result());
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker panicked");
    }

    assert!(engine.registry().is_empty());
    assert_eq!(counter.count(), WORKERS * ITERATIONS / 2);
}
