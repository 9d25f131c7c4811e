//! Permission resolution for a single assertion call.
//!
//! Pure functions: the only inputs are the current authority, the
//! session-attached signal and whether any log sink is registered.
//! Permissions are derived fresh on every call and never stored.

use crate::types::{BreakAuthority, PermissionSet};

/// Permissions for the delegated (`when`) path.
///
/// Breaking requires both an authority in the `*On` family and an
/// attached session; logging requires only a registered sink and is
/// independent of break permission.
#[must_use]
pub fn resolve_delegated(
    authority: BreakAuthority,
    session_attached: bool,
    log_registered: bool,
) -> PermissionSet {
    PermissionSet {
        may_break: authority.allows_break() && session_attached,
        may_log: log_registered,
    }
}

/// Permissions for the explicit (`break_when`) path.
///
/// Ignores the authority and any log sinks entirely: the path exists
/// to force a break while a session is attached, and never logs.
#[must_use]
pub fn resolve_explicit(session_attached: bool) -> PermissionSet {
    PermissionSet {
        may_break: session_attached,
        may_log: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delegated_break_requires_authority_and_session() {
        for authority in [
            BreakAuthority::DynamicOff,
            BreakAuthority::DynamicOn,
            BreakAuthority::LockedOff,
            BreakAuthority::LockedOn,
        ] {
            for attached in [false, true] {
                let perms = resolve_delegated(authority, attached, false);
                assert_eq!(perms.may_break, authority.allows_break() && attached);
            }
        }
    }

    #[test]
    fn delegated_log_is_independent_of_break() {
        let perms = resolve_delegated(BreakAuthority::LockedOff, false, true);
        assert!(perms.may_log);
        assert!(!perms.may_break);

        let perms = resolve_delegated(BreakAuthority::LockedOn, true, false);
        assert!(!perms.may_log);
        assert!(perms.may_break);
    }

    #[test]
    fn explicit_path_never_logs() {
        assert_eq!(
            resolve_explicit(true),
            PermissionSet {
                may_break: true,
                may_log: false
            }
        );
        assert_eq!(resolve_explicit(false), PermissionSet::none());
    }
}
