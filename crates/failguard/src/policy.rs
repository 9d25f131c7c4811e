//! Break-authority state machine.
//!
//! A one-way ratchet: dynamic authorities may move anywhere, locked
//! authorities never move again. Deployed builds cannot re-enable
//! interactive breaking at runtime even if a caller attempts it; the
//! locked-state, build-profile and session-attached guards are
//! intentionally redundant.

use crate::types::{BreakAuthority, BuildProfile};
use parking_lot::Mutex;

/// Process-wide holder of the current [`BreakAuthority`].
#[derive(Debug)]
pub struct AuthorizationPolicy {
    build: BuildProfile,
    slot: Mutex<BreakAuthority>,
}

impl AuthorizationPolicy {
    /// Creates a policy seeded with the build-profile default.
    #[must_use]
    pub fn new(build: BuildProfile) -> Self {
        Self {
            build,
            slot: Mutex::new(BreakAuthority::default_for(build)),
        }
    }

    /// The build profile this policy was constructed for.
    #[must_use]
    pub fn build(&self) -> BuildProfile {
        self.build
    }

    /// Current authority. Thread-safe snapshot read.
    #[must_use]
    pub fn authority(&self) -> BreakAuthority {
        *self.slot.lock()
    }

    /// Attempts a runtime authority change.
    ///
    /// Returns `false` with the state unchanged when the current
    /// authority is locked, the build is deployed, or no interactive
    /// session is attached.
    pub fn try_set(&self, next: BreakAuthority, session_attached: bool) -> bool {
        let mut slot = self.slot.lock();
        if slot.is_locked() {
            return false;
        }
        if self.build.is_deployed() {
            return false;
        }
        if !session_attached {
            return false;
        }
        tracing::debug!(from = ?*slot, to = ?next, "break authority changed");
        *slot = next;
        true
    }

    /// Applies the configured starting authority. Used exactly once by
    /// engine initialization, before any assertion can observe the slot.
    pub(crate) fn install_initial(&self, authority: BreakAuthority) {
        *self.slot.lock() = authority;
    }
}
