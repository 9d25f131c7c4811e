//! FailGuard - conditional diagnostic assertions.
//!
//! Callers express a predicate ("this value is absent", "this operation
//! failed") and the engine decides, based on a runtime break authority,
//! whether to fire the breakpoint trap, emit a diagnostic log record,
//! or do nothing beyond returning a boolean. Failures caught by a
//! guarded call are not re-raised; they are stored under an opaque
//! token and exposed through a fluent, first-match-wins
//! [`RecoveryChain`].

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod global;
pub mod policy;
pub mod recovery;
pub mod registry;
pub mod session;
pub mod types;

pub use config::{CaptureLogPolicy, CatchAdapter, EngineConfig, PanicGuard, Passthrough};
pub use engine::{Assertions, DiagnosticEngine, PrimitiveAssertions};
pub use error::EngineError;
pub use policy::AuthorizationPolicy;
pub use recovery::{ChainState, RecoveryChain};
pub use registry::{FailureRegistry, FailureToken, StoredFailure};
pub use session::{Attached, DebugSession, Detached, EnvSession};
pub use types::{BreakAuthority, BreakEvent, BuildProfile, PermissionSet};

/// Expands to the fully qualified name of the enclosing function,
/// for use as the caller identity on the `*_as` entry points.
///
/// ```
/// fn load_config() -> &'static str {
///     failguard::caller!()
/// }
/// assert!(load_config().ends_with("load_config"));
/// ```
#[macro_export]
macro_rules! caller {
    () => {{
        fn here() {}
        fn name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let full = name_of(here);
        full.strip_suffix("::here").unwrap_or(full)
    }};
}
