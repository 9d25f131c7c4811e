//! Shared value types for the diagnostic engine.

use serde::{Deserialize, Serialize};

/// Process-wide permission governing the interactive breakpoint trap.
///
/// The `Dynamic*` variants may still be changed at runtime (subject to
/// the guards in [`crate::policy::AuthorizationPolicy`]); once a
/// `Locked*` variant is active the authority can never change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakAuthority {
    /// Breaking disabled, runtime changes still permitted.
    DynamicOff,
    /// Breaking enabled, runtime changes still permitted.
    DynamicOn,
    /// Breaking disabled permanently. The value for deployed builds.
    LockedOff,
    /// Breaking enabled permanently.
    LockedOn,
}

impl BreakAuthority {
    /// Whether this authority is in the locked family.
    #[must_use]
    pub fn is_locked(self) -> bool {
        matches!(self, Self::LockedOff | Self::LockedOn)
    }

    /// Whether this authority permits the trap to fire at all.
    #[must_use]
    pub fn allows_break(self) -> bool {
        matches!(self, Self::DynamicOn | Self::LockedOn)
    }

    /// The starting authority for a build profile.
    #[must_use]
    pub fn default_for(build: BuildProfile) -> Self {
        match build {
            BuildProfile::Development => Self::DynamicOff,
            BuildProfile::Deployed => Self::LockedOff,
        }
    }
}

/// Runtime build marker, passed in at engine construction.
///
/// The same source compiles for every target; the restriction on the
/// explicit break path is enforced by a runtime check against this
/// profile rather than conditional compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildProfile {
    /// Interactive development build. The explicit break path is legal.
    Development,
    /// Release-style deployment. The explicit break path fails loudly.
    Deployed,
}

impl BuildProfile {
    /// Whether this is a deployment build.
    #[must_use]
    pub fn is_deployed(self) -> bool {
        matches!(self, Self::Deployed)
    }
}

/// Permissions derived for a single assertion call.
///
/// Never persisted; always freshly computed by the context resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PermissionSet {
    /// The breakpoint trap may fire on a true-resolving predicate.
    pub may_break: bool,
    /// The break sink may be invoked on a true-resolving predicate.
    pub may_log: bool,
}

impl PermissionSet {
    /// Logic-only permissions: no break, no log.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}

/// Record handed to the break sink when a predicate resolves true.
#[derive(Debug, Clone, Serialize)]
pub struct BreakEvent {
    /// Caller identity supplied at the assertion entry point.
    pub caller: String,
    /// Engine path that resolved true, e.g. `when.is_null`.
    pub predicate: &'static str,
    /// Debug rendering of the value that was tested.
    pub value: String,
}
