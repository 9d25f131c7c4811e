//! Optional process-wide engine.
//!
//! Most callers should construct a [`DiagnosticEngine`] and pass it
//! explicitly. For codebases that want the ambient surface, a single
//! engine can be installed once per process and looked up anywhere.

use crate::engine::DiagnosticEngine;
use crate::error::EngineError;
use once_cell::sync::OnceCell;

static INSTALLED: OnceCell<DiagnosticEngine> = OnceCell::new();

/// Installs the process-wide engine. The second attempt fails with
/// [`EngineError::AlreadyInitialized`] and the first engine stays.
pub fn install(engine: DiagnosticEngine) -> Result<&'static DiagnosticEngine, EngineError> {
    INSTALLED
        .set(engine)
        .map_err(|_| EngineError::AlreadyInitialized)?;
    tracing::debug!("process-wide diagnostic engine installed");
    global()
}

/// The installed engine, if any.
#[must_use]
pub fn try_global() -> Option<&'static DiagnosticEngine> {
    INSTALLED.get()
}

/// The installed engine, or [`EngineError::NotInitialized`].
pub fn global() -> Result<&'static DiagnosticEngine, EngineError> {
    try_global().ok_or(EngineError::NotInitialized)
}
