//! Engine error taxonomy.
//!
//! These errors are programmer-contract violations and are always
//! surfaced immediately. Application failures captured by a guarded
//! call are never represented here; they become registry entries and
//! flow through the recovery chain instead.

/// Contract violations raised by the diagnostic engine itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The delegated assertion path was used before `initialize`.
    #[error("diagnostic engine is not initialized")]
    NotInitialized,

    /// `initialize` (or a global install) was attempted twice.
    #[error("diagnostic engine is already initialized")]
    AlreadyInitialized,

    /// The explicit break path was invoked from a deployed build.
    #[error("explicit break assertions are not available in deployed builds")]
    IllegalInDeployedBuild,
}

impl EngineError {
    /// Whether this error concerns the one-time initialization lifecycle.
    #[inline]
    #[must_use]
    pub fn is_initialization(&self) -> bool {
        matches!(self, Self::NotInitialized | Self::AlreadyInitialized)
    }

    /// Whether this error is fatal by design and should never be retried.
    ///
    /// The explicit path existing in a deployed build is a call-site bug
    /// that must be caught before shipping, not worked around.
    #[inline]
    #[must_use]
    pub fn is_fatal_by_design(&self) -> bool {
        matches!(self, Self::IllegalInDeployedBuild)
    }
}
