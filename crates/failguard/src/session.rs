//! Interactive-session probes.
//!
//! Whether an interactive debugging session is attached is an
//! environment signal, not something the engine can observe portably.
//! Callers inject a probe at engine construction; tests substitute a
//! stub.

use std::env;

/// Reports whether an interactive debugging session is attached.
pub trait DebugSession: Send + Sync {
    /// True while a session that can service a breakpoint is attached.
    fn is_attached(&self) -> bool;
}

/// Probe that always reports an attached session.
#[derive(Debug, Clone, Copy, Default)]
pub struct Attached;

impl DebugSession for Attached {
    fn is_attached(&self) -> bool {
        true
    }
}

/// Probe that never reports an attached session. The safe default.
#[derive(Debug, Clone, Copy, Default)]
pub struct Detached;

impl DebugSession for Detached {
    fn is_attached(&self) -> bool {
        false
    }
}

/// Probe driven by an environment variable, resolved on every read so
/// a harness can attach mid-run.
#[derive(Debug, Clone)]
pub struct EnvSession {
    var: String,
}

impl EnvSession {
    /// Default environment variable consulted by [`EnvSession`].
    pub const DEFAULT_VAR: &'static str = "FAILGUARD_SESSION";

    /// Probe reading a custom environment variable.
    #[must_use]
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvSession {
    fn default() -> Self {
        Self::new(Self::DEFAULT_VAR)
    }
}

impl DebugSession for EnvSession {
    fn is_attached(&self) -> bool {
        match env::var(&self.var) {
            Ok(value) => !value.is_empty() && value != "0",
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_probes() {
        assert!(Attached.is_attached());
        assert!(!Detached.is_attached());
    }

    #[test]
    fn env_probe_reads_its_variable() {
        let probe = EnvSession::new("FAILGUARD_SESSION_TEST_PROBE");
        assert!(!probe.is_attached());

        env::set_var("FAILGUARD_SESSION_TEST_PROBE", "1");
        assert!(probe.is_attached());

        env::set_var("FAILGUARD_SESSION_TEST_PROBE", "0");
        assert!(!probe.is_attached());

        env::remove_var("FAILGUARD_SESSION_TEST_PROBE");
    }
}
