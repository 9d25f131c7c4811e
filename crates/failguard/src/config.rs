//! Engine configuration.
//!
//! One config object, supplied once to [`crate::DiagnosticEngine::initialize`]:
//! the starting break authority, the mandatory catch adapter that runs
//! guarded operations in the caller's own stack context, the optional
//! break/throw sinks, the optional breakpoint trap hook and the
//! capture-log policy.

use crate::registry::StoredFailure;
use crate::types::{BreakAuthority, BreakEvent};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// An erased guarded operation. Returns the failure it raised, if any.
pub type GuardedOp<'a> = &'a mut dyn FnMut() -> Option<StoredFailure>;

/// Executes a guarded operation and reports what it raised.
///
/// Supplied by the caller so guarded calls run under the caller's own
/// catch discipline. Adapters must invoke `op` exactly once and must
/// not re-enter the engine while doing so.
pub trait CatchAdapter: Send + Sync {
    /// Runs `op`, returning the failure it raised, if any.
    fn call(&self, op: GuardedOp<'_>) -> Option<StoredFailure>;
}

/// Adapter that only captures `Err` returns; panics propagate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl CatchAdapter for Passthrough {
    fn call(&self, op: GuardedOp<'_>) -> Option<StoredFailure> {
        op()
    }
}

/// Adapter that additionally converts panics into stored failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanicGuard;

impl CatchAdapter for PanicGuard {
    fn call(&self, op: GuardedOp<'_>) -> Option<StoredFailure> {
        match catch_unwind(AssertUnwindSafe(|| op())) {
            Ok(raised) => raised,
            Err(payload) => {
                tracing::debug!("guarded operation panicked; payload captured");
                Some(StoredFailure::from_panic(payload))
            }
        }
    }
}

/// Whether a capture that is later handled by the chain still reaches
/// the throw sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureLogPolicy {
    /// Log every capture immediately, before the trap fires.
    #[default]
    Immediate,
    /// Log at chain drop, and only if no handler matched. Under this
    /// policy the trap still fires at capture time, so a trap can
    /// precede its log record.
    DeferUnhandled,
}

/// Sink invoked when a predicate resolves true and logging is permitted.
pub type BreakSink = Box<dyn Fn(&BreakEvent) + Send + Sync>;

/// Sink invoked with `(caller, failure)` when a guarded call captures.
pub type ThrowSink = Box<dyn Fn(&str, &StoredFailure) + Send + Sync>;

/// Hook standing in for the interactive breakpoint trap.
pub type TrapHook = Box<dyn Fn() + Send + Sync>;

/// Everything the engine needs beyond its construction-time context.
pub struct EngineConfig {
    pub(crate) authority: BreakAuthority,
    pub(crate) adapter: Arc<dyn CatchAdapter>,
    pub(crate) on_break: Option<BreakSink>,
    pub(crate) on_throw: Option<ThrowSink>,
    pub(crate) trap: Option<TrapHook>,
    pub(crate) capture_log: CaptureLogPolicy,
}

impl EngineConfig {
    /// Config with the mandatory pieces: starting authority and the
    /// catch adapter. Sinks, trap and policy are added with `with_*`.
    #[must_use]
    pub fn new(authority: BreakAuthority, adapter: impl CatchAdapter + 'static) -> Self {
        Self {
            authority,
            adapter: Arc::new(adapter),
            on_break: None,
            on_throw: None,
            trap: None,
            capture_log: CaptureLogPolicy::default(),
        }
    }

    /// Registers the break-event sink.
    #[must_use]
    pub fn with_break_sink(mut self, sink: impl Fn(&BreakEvent) + Send + Sync + 'static) -> Self {
        self.on_break = Some(Box::new(sink));
        self
    }

    /// Registers the throw-event sink.
    #[must_use]
    pub fn with_throw_sink(
        mut self,
        sink: impl Fn(&str, &StoredFailure) + Send + Sync + 'static,
    ) -> Self {
        self.on_throw = Some(Box::new(sink));
        self
    }

    /// Installs the breakpoint trap hook. Without one, a permitted
    /// break only emits a tracing event.
    #[must_use]
    pub fn with_trap(mut self, trap: impl Fn() + Send + Sync + 'static) -> Self {
        self.trap = Some(Box::new(trap));
        self
    }

    /// Selects the capture-log policy.
    #[must_use]
    pub fn with_capture_log(mut self, policy: CaptureLogPolicy) -> Self {
        self.capture_log = policy;
        self
    }

    /// Whether any log sink is registered. Drives `may_log`.
    pub(crate) fn log_registered(&self) -> bool {
        self.on_break.is_some() || self.on_throw.is_some()
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("authority", &self.authority)
            .field("on_break", &self.on_break.is_some())
            .field("on_throw", &self.on_throw.is_some())
            .field("trap", &self.trap.is_some())
            .field("capture_log", &self.capture_log)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_registered_tracks_either_sink() {
        let bare = EngineConfig::new(BreakAuthority::DynamicOff, Passthrough);
        assert!(!bare.log_registered());

        let with_break = EngineConfig::new(BreakAuthority::DynamicOff, Passthrough)
            .with_break_sink(|_event| {});
        assert!(with_break.log_registered());

        let with_throw = EngineConfig::new(BreakAuthority::DynamicOff, Passthrough)
            .with_throw_sink(|_caller, _failure| {});
        assert!(with_throw.log_registered());
    }

    #[test]
    fn panic_guard_converts_panics() {
        let mut op = || -> Option<StoredFailure> { panic!("kaboom") };
        let raised = PanicGuard.call(&mut op).expect("panic captured");
        assert_eq!(raised.message(), "kaboom");
    }

    #[test]
    fn passthrough_forwards_clean_completion() {
        let mut op = || -> Option<StoredFailure> { None };
        assert!(Passthrough.call(&mut op).is_none());
    }
}
