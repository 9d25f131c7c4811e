//! Testing utilities for the FailGuard workspace
//!
//! Shared fixtures: counting sinks, stub session probes, engine
//! builders and a tracing bootstrap for tests.

#![allow(missing_docs)]

use failguard::{
    BreakAuthority, BreakEvent, BuildProfile, DebugSession, DiagnosticEngine, EngineConfig,
    PanicGuard, StoredFailure,
};
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Installs a test-writer tracing subscriber once per process.
/// Controlled by `RUST_LOG`; silent by default.
pub fn init_test_tracing() {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Cloneable shared counter for sink and trap invocations.
#[derive(Debug, Clone, Default)]
pub struct EventCounter(Arc<AtomicUsize>);

impl EventCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.0.store(0, Ordering::SeqCst);
    }
}

/// Fixed-answer session probe.
#[derive(Debug, Clone, Copy)]
pub struct StubSession(pub bool);

impl DebugSession for StubSession {
    fn is_attached(&self) -> bool {
        self.0
    }
}

/// Config whose break and throw sinks both bump `counter`.
pub fn counting_config(authority: BreakAuthority, counter: &EventCounter) -> EngineConfig {
    let break_hits = counter.clone();
    let throw_hits = counter.clone();
    EngineConfig::new(authority, PanicGuard)
        .with_break_sink(move |_event: &BreakEvent| break_hits.bump())
        .with_throw_sink(move |_caller: &str, _failure: &StoredFailure| throw_hits.bump())
}

/// Development engine, session attached, counting sinks, breaking off.
pub fn logging_engine(counter: &EventCounter) -> DiagnosticEngine {
    init_test_tracing();
    let engine = DiagnosticEngine::new(BuildProfile::Development, StubSession(true));
    engine
        .initialize(counting_config(BreakAuthority::DynamicOff, counter))
        .expect("engine initializes once");
    engine
}

/// Development engine with breaking authorized, counting sinks and a
/// counting trap hook.
pub fn breaking_engine(logs: &EventCounter, traps: &EventCounter) -> DiagnosticEngine {
    init_test_tracing();
    let trap_hits = traps.clone();
    let config =
        counting_config(BreakAuthority::DynamicOn, logs).with_trap(move || trap_hits.bump());
    let engine = DiagnosticEngine::new(BuildProfile::Development, StubSession(true));
    engine.initialize(config).expect("engine initializes once");
    engine
}

/// Engine with no sinks at all (logging never permitted).
pub fn silent_engine(build: BuildProfile, attached: bool) -> DiagnosticEngine {
    init_test_tracing();
    let engine = DiagnosticEngine::new(build, StubSession(attached));
    engine
        .initialize(EngineConfig::new(BreakAuthority::DynamicOff, PanicGuard))
        .expect("engine initializes once");
    engine
}
