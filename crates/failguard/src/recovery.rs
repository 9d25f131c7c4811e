//! Post-hoc failure recovery chain.
//!
//! Returned by `guarded_call`. Handlers are evaluated in declaration
//! order and at most one runs per captured failure: the first typed
//! guard whose type matches consumes the chain, everything after it is
//! a no-op. Dropping the chain releases the registry entry.

use crate::config::EngineConfig;
use crate::registry::{FailureRegistry, FailureToken, StoredFailure};
use std::any::Any;
use std::sync::Arc;

/// Where the chain is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    /// The guarded operation completed without raising.
    NoFailure,
    /// A failure was captured and no handler has matched yet.
    Unhandled,
    /// A handler matched and consumed the chain.
    Handled,
}

/// Fluent dispatch over a captured failure.
pub struct RecoveryChain {
    state: ChainState,
    token: Option<FailureToken>,
    registry: Option<Arc<FailureRegistry>>,
    config: Option<Arc<EngineConfig>>,
    caller: String,
    log_on_drop: bool,
}

impl RecoveryChain {
    /// Chain for a guarded call that completed cleanly.
    pub(crate) fn clean() -> Self {
        Self {
            state: ChainState::NoFailure,
            token: None,
            registry: None,
            config: None,
            caller: String::new(),
            log_on_drop: false,
        }
    }

    /// Chain wrapping a freshly captured failure.
    pub(crate) fn captured(
        token: FailureToken,
        registry: Arc<FailureRegistry>,
        config: Arc<EngineConfig>,
        caller: String,
        log_on_drop: bool,
    ) -> Self {
        Self {
            state: ChainState::Unhandled,
            token: Some(token),
            registry: Some(registry),
            config: Some(config),
            caller,
            log_on_drop,
        }
    }

    /// True iff a failure was captured, whether or not it was handled.
    #[must_use]
    pub fn result(&self) -> bool {
        self.state != ChainState::NoFailure
    }

    /// True once a handler has matched.
    #[must_use]
    pub fn handled(&self) -> bool {
        self.state == ChainState::Handled
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ChainState {
        self.state
    }

    /// Type-guarded handler. Runs `handler` iff the chain is still
    /// unhandled and the captured failure is concretely a `T`; the
    /// first match consumes the chain.
    #[must_use]
    pub fn on<T, F>(mut self, handler: F) -> Self
    where
        T: Any,
        F: FnOnce(&T),
    {
        if self.state != ChainState::Unhandled {
            return self;
        }
        if let Some(stored) = self.lookup() {
            if let Some(concrete) = stored.downcast_ref::<T>() {
                handler(concrete);
                self.state = ChainState::Handled;
            }
        }
        self
    }

    /// Catch-all terminal handler. Runs iff no prior typed guard
    /// matched; returns [`result`](Self::result).
    pub fn on_any<F>(mut self, handler: F) -> bool
    where
        F: FnOnce(&StoredFailure),
    {
        if self.state == ChainState::Unhandled {
            if let Some(stored) = self.lookup() {
                handler(stored.as_ref());
            }
            self.state = ChainState::Handled;
        }
        self.result()
    }

    fn lookup(&self) -> Option<Arc<StoredFailure>> {
        let token = self.token?;
        self.registry.as_ref()?.resolve(token)
    }
}

impl Drop for RecoveryChain {
    fn drop(&mut self) {
        let Some(token) = self.token.take() else {
            return;
        };
        if self.log_on_drop && self.state == ChainState::Unhandled {
            if let (Some(config), Some(registry)) = (self.config.as_ref(), self.registry.as_ref()) {
                if let (Some(sink), Some(stored)) = (config.on_throw.as_ref(), registry.resolve(token))
                {
                    sink(&self.caller, stored.as_ref());
                }
            }
        }
        if let Some(registry) = self.registry.take() {
            registry.release(token);
        }
    }
}

impl std::fmt::Debug for RecoveryChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveryChain")
            .field("state", &self.state)
            .field("token", &self.token)
            .field("caller", &self.caller)
            .finish_non_exhaustive()
    }
}
