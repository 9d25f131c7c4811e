//! The assertion engine.
//!
//! [`DiagnosticEngine`] is the process-wide context object: it owns
//! the authorization policy, the failure registry, the session probe
//! and the once-installed configuration. It is constructed explicitly
//! and passed by reference (or installed via [`crate::global`]);
//! tests substitute a fresh engine per run.

use crate::config::{CaptureLogPolicy, EngineConfig};
use crate::context;
use crate::error::EngineError;
use crate::policy::AuthorizationPolicy;
use crate::recovery::RecoveryChain;
use crate::registry::{FailureRegistry, StoredFailure};
use crate::session::DebugSession;
use crate::types::{BreakAuthority, BreakEvent, BuildProfile, PermissionSet};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// Process-wide diagnostic-assertion context.
pub struct DiagnosticEngine {
    build: BuildProfile,
    session: Arc<dyn DebugSession>,
    policy: AuthorizationPolicy,
    registry: Arc<FailureRegistry>,
    config: OnceCell<Arc<EngineConfig>>,
}

impl DiagnosticEngine {
    /// Creates an uninitialized engine for the given build profile and
    /// session probe. The break authority starts at the build default.
    #[must_use]
    pub fn new(build: BuildProfile, session: impl DebugSession + 'static) -> Self {
        Self {
            build,
            session: Arc::new(session),
            policy: AuthorizationPolicy::new(build),
            registry: Arc::new(FailureRegistry::new()),
            config: OnceCell::new(),
        }
    }

    /// The build profile this engine was constructed for.
    #[must_use]
    pub fn build(&self) -> BuildProfile {
        self.build
    }

    /// One-time configuration. The second attempt fails with
    /// [`EngineError::AlreadyInitialized`] and changes nothing.
    pub fn initialize(&self, config: EngineConfig) -> Result<(), EngineError> {
        let authority = config.authority;
        self.config
            .set(Arc::new(config))
            .map_err(|_| EngineError::AlreadyInitialized)?;
        self.policy.install_initial(authority);
        tracing::debug!(?authority, build = ?self.build, "diagnostic engine initialized");
        Ok(())
    }

    /// Whether `initialize` has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.config.get().is_some()
    }

    /// Current break authority.
    #[must_use]
    pub fn authority(&self) -> BreakAuthority {
        self.policy.authority()
    }

    /// Attempts a runtime authority change through the policy ratchet.
    ///
    /// Must not be called from inside concurrent workers performing
    /// guarded assertions; a mid-flight flip yields inconsistent
    /// permissions for calls resolving concurrently.
    pub fn try_set_authority(&self, next: BreakAuthority) -> bool {
        self.policy.try_set(next, self.session.is_attached())
    }

    /// The failure registry, exposed for diagnostics and tests.
    #[must_use]
    pub fn registry(&self) -> &FailureRegistry {
        &self.registry
    }

    /// Delegated assertion path with a defaulted caller identity.
    pub fn when(&self) -> Result<Assertions<'_>, EngineError> {
        self.when_as("")
    }

    /// Delegated assertion path. Permissions are derived from the
    /// policy, the session probe and the registered sinks; fails with
    /// [`EngineError::NotInitialized`] before `initialize`.
    pub fn when_as(&self, caller: &str) -> Result<Assertions<'_>, EngineError> {
        let config = self.config.get().ok_or(EngineError::NotInitialized)?;
        let perms = context::resolve_delegated(
            self.policy.authority(),
            self.session.is_attached(),
            config.log_registered(),
        );
        Ok(Assertions {
            engine: self,
            config: Arc::clone(config),
            perms,
            caller: caller.to_string(),
        })
    }

    /// Explicit break path with a defaulted caller identity.
    pub fn break_when(&self) -> Result<PrimitiveAssertions<'_>, EngineError> {
        self.break_when_as("")
    }

    /// Explicit break path: ignores the policy and every sink, breaks
    /// iff a session is attached, never logs. Only legal in
    /// development builds; fails with
    /// [`EngineError::IllegalInDeployedBuild`] otherwise, regardless
    /// of any predicate outcome. Needs no prior initialization.
    pub fn break_when_as(&self, caller: &str) -> Result<PrimitiveAssertions<'_>, EngineError> {
        if self.build.is_deployed() {
            return Err(EngineError::IllegalInDeployedBuild);
        }
        let perms = context::resolve_explicit(self.session.is_attached());
        Ok(PrimitiveAssertions {
            engine: self,
            perms,
            caller: caller.to_string(),
        })
    }

    /// Reports a true-resolving predicate: sink first, trap second, so
    /// a paused debugger always sees the logged event.
    fn report_hit(
        &self,
        config: Option<&EngineConfig>,
        perms: PermissionSet,
        caller: &str,
        predicate: &'static str,
        value: &dyn fmt::Debug,
    ) {
        if perms.may_log {
            if let Some(sink) = config.and_then(|c| c.on_break.as_ref()) {
                let event = BreakEvent {
                    caller: caller.to_string(),
                    predicate,
                    value: format!("{value:?}"),
                };
                sink(&event);
            }
        }
        tracing::trace!(caller, predicate, "predicate resolved true");
        if perms.may_break {
            self.fire_trap(config, caller, predicate);
        }
    }

    fn fire_trap(&self, config: Option<&EngineConfig>, caller: &str, predicate: &'static str) {
        match config.and_then(|c| c.trap.as_ref()) {
            Some(trap) => trap(),
            None => {
                tracing::warn!(caller, predicate, "breakpoint trap requested with no hook installed");
            }
        }
    }
}

impl fmt::Debug for DiagnosticEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticEngine")
            .field("build", &self.build)
            .field("authority", &self.policy.authority())
            .field("initialized", &self.is_initialized())
            .field("live_failures", &self.registry.live())
            .finish_non_exhaustive()
    }
}

/// Delegated-path operations: the four primitive predicates plus the
/// failure-capturing guarded call.
#[derive(Debug)]
pub struct Assertions<'e> {
    engine: &'e DiagnosticEngine,
    config: Arc<EngineConfig>,
    perms: PermissionSet,
    caller: String,
}

impl Assertions<'_> {
    /// True iff the value is absent.
    pub fn is_null<T: fmt::Debug>(&self, value: &Option<T>) -> bool {
        if value.is_some() {
            return false;
        }
        self.hit("when.is_null", value);
        true
    }

    /// True iff the value is present.
    pub fn is_not_null<T: fmt::Debug>(&self, value: &Option<T>) -> bool {
        if value.is_none() {
            return false;
        }
        self.hit("when.is_not_null", value);
        true
    }

    /// True iff the tri-state value is exactly `Some(true)`. An
    /// absent value is not true.
    pub fn is_true(&self, test: Option<bool>) -> bool {
        if test != Some(true) {
            return false;
        }
        self.hit("when.is_true", &test);
        true
    }

    /// True iff the tri-state value is anything but `Some(true)`;
    /// absent counts as not-true.
    pub fn is_not_true(&self, test: Option<bool>) -> bool {
        if test == Some(true) {
            return false;
        }
        self.hit("when.is_not_true", &test);
        true
    }

    /// Executes `op` under the configured catch adapter. A raised
    /// failure is captured into the registry, reported (log first,
    /// trap second) and wrapped in a [`RecoveryChain`]; a clean
    /// completion reports nothing.
    pub fn guarded_call<E, F>(&self, op: F) -> RecoveryChain
    where
        E: std::error::Error + Send + 'static,
        F: FnOnce() -> Result<(), E>,
    {
        let mut pending = Some(op);
        let mut erased = move || -> Option<StoredFailure> {
            match pending.take() {
                Some(run) => run().err().map(StoredFailure::from_error),
                None => {
                    tracing::error!("catch adapter invoked the guarded operation more than once");
                    None
                }
            }
        };
        let raised = self.config.adapter.call(&mut erased);

        let Some(mut failure) = raised else {
            return RecoveryChain::clean();
        };
        failure.set_origin(&self.caller);
        let token = self.engine.registry.capture(failure);
        tracing::debug!(caller = %self.caller, slot = token.slot(), "guarded call captured a failure");

        let deferred = self.config.capture_log == CaptureLogPolicy::DeferUnhandled;
        if self.perms.may_log && !deferred {
            if let (Some(sink), Some(stored)) = (
                self.config.on_throw.as_ref(),
                self.engine.registry.resolve(token),
            ) {
                sink(&self.caller, stored.as_ref());
            }
        }
        if self.perms.may_break {
            self.engine
                .fire_trap(Some(&*self.config), &self.caller, "when.guarded_call");
        }

        RecoveryChain::captured(
            token,
            Arc::clone(&self.engine.registry),
            Arc::clone(&self.config),
            self.caller.clone(),
            self.perms.may_log && deferred,
        )
    }

    fn hit(&self, predicate: &'static str, value: &dyn fmt::Debug) {
        self.engine
            .report_hit(Some(&*self.config), self.perms, &self.caller, predicate, value);
    }
}

/// Explicit-path operations: primitive predicates only. No guarded
/// call, no logging, ever.
#[derive(Debug)]
pub struct PrimitiveAssertions<'e> {
    engine: &'e DiagnosticEngine,
    perms: PermissionSet,
    caller: String,
}

impl PrimitiveAssertions<'_> {
    /// True iff the value is absent.
    pub fn is_null<T: fmt::Debug>(&self, value: &Option<T>) -> bool {
        if value.is_some() {
            return false;
        }
        self.hit("break_when.is_null", value);
        true
    }

    /// True iff the value is present.
    pub fn is_not_null<T: fmt::Debug>(&self, value: &Option<T>) -> bool {
        if value.is_none() {
            return false;
        }
        self.hit("break_when.is_not_null", value);
        true
    }

    /// True iff the tri-state value is exactly `Some(true)`.
    pub fn is_true(&self, test: Option<bool>) -> bool {
        if test != Some(true) {
            return false;
        }
        self.hit("break_when.is_true", &test);
        true
    }

    /// True iff the tri-state value is anything but `Some(true)`.
    pub fn is_not_true(&self, test: Option<bool>) -> bool {
        if test == Some(true) {
            return false;
        }
        self.hit("break_when.is_not_true", &test);
        true
    }

    fn hit(&self, predicate: &'static str, value: &dyn fmt::Debug) {
        let config = self.engine.config.get().map(|config| &**config);
        self.engine
            .report_hit(config, self.perms, &self.caller, predicate, value);
    }
}
