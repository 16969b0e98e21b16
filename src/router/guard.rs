//! Navigation guard: decides whether a transition may proceed.
//!
//! Two layers, both of which must pass:
//! - the global guard looks at the leaf route's publicness against the
//!   authentication state (authentication failures go to the login screen,
//!   signed-in users are bounced off guest-only screens);
//! - the per-route entry guard checks each matched record's role
//!   requirement (authorization failures go to the unauthorized screen).

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use super::routes::{AccessPolicy, RouteDef, RouteName};
use crate::state::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Redirect(RouteName),
}

/// Evaluate a transition to the `matched` chain (outermost first).
///
/// An empty chain is an unknown path and is treated as requiring
/// authentication.
#[must_use]
pub fn evaluate(matched: &[&RouteDef], session: &Session) -> Verdict {
    let verdict = global_guard(matched.last().copied(), session);
    if verdict != Verdict::Allow {
        return verdict;
    }
    matched
        .iter()
        .map(|route| route_entry_guard(route, session))
        .find(|v| *v != Verdict::Allow)
        .unwrap_or(Verdict::Allow)
}

/// Authentication layer, run on every transition.
#[must_use]
pub fn global_guard(leaf: Option<&RouteDef>, session: &Session) -> Verdict {
    let authenticated = session.is_authenticated();
    let public = leaf.is_some_and(|r| r.policy.is_public());
    let guest_only = leaf.is_some_and(|r| r.guest_only);

    if guest_only && authenticated {
        Verdict::Redirect(RouteName::Home)
    } else if !public && !authenticated {
        Verdict::Redirect(RouteName::Login)
    } else {
        Verdict::Allow
    }
}

/// Authorization layer attached to a single route record.
#[must_use]
pub fn route_entry_guard(route: &RouteDef, session: &Session) -> Verdict {
    match &route.policy {
        AccessPolicy::RoleRestricted(_) if !session.is_authenticated() => Verdict::Redirect(RouteName::Login),
        AccessPolicy::RoleRestricted(role) if !session.has_role(role) => Verdict::Redirect(RouteName::Unauthorized),
        _ => Verdict::Allow,
    }
}
