//! Static route table and path resolution.
//!
//! Routes are declared once at start-up and never change. Resolution returns
//! the matched chain from the outermost record to the leaf so guards can
//! check the requirements of every level, as nested views are only entered
//! when their parents are.

#[cfg(test)]
#[path = "routes_test.rs"]
mod routes_test;

use crate::state::identity::Role;

/// Named destinations the application redirects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteName {
    Login,
    Home,
    User,
    Unauthorized,
}

impl RouteName {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Home => "/",
            Self::User => "/user",
            Self::Unauthorized => "/unauthorized",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Home => "home",
            Self::User => "user",
            Self::Unauthorized => "unauthorized",
        }
    }
}

/// Who may enter a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessPolicy {
    Public,
    Authenticated,
    /// Authenticated and holding the given role.
    RoleRestricted(Role),
}

impl AccessPolicy {
    #[must_use]
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Public)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDef {
    pub name: RouteName,
    /// Segment relative to the parent; top-level records start with `/`.
    pub path: &'static str,
    pub policy: AccessPolicy,
    /// Public route that a signed-in user is sent away from.
    pub guest_only: bool,
    pub children: Vec<RouteDef>,
}

impl RouteDef {
    #[must_use]
    pub fn new(name: RouteName, path: &'static str) -> Self {
        Self { name, path, policy: AccessPolicy::Authenticated, guest_only: false, children: Vec::new() }
    }

    #[must_use]
    pub fn public(mut self) -> Self {
        self.policy = AccessPolicy::Public;
        self
    }

    #[must_use]
    pub fn guest_only(mut self) -> Self {
        self.policy = AccessPolicy::Public;
        self.guest_only = true;
        self
    }

    #[must_use]
    pub fn requires_role(mut self, role: Role) -> Self {
        self.policy = AccessPolicy::RoleRestricted(role);
        self
    }

    #[must_use]
    pub fn child(mut self, child: RouteDef) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteDef>,
}

impl RouteTable {
    #[must_use]
    pub fn new(routes: Vec<RouteDef>) -> Self {
        Self { routes }
    }

    /// The application's routes: login, home with the admin-only user
    /// screen nested under it, and the unauthorized notice.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(vec![
            RouteDef::new(RouteName::Login, "/login").guest_only(),
            RouteDef::new(RouteName::Home, "/").child(RouteDef::new(RouteName::User, "user").requires_role(Role::Admin)),
            RouteDef::new(RouteName::Unauthorized, "/unauthorized").public(),
        ])
    }

    /// Matched chain for `path`, outermost first. Empty when nothing matches.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Vec<&RouteDef> {
        let target = normalize_path(path);
        let mut chain = Vec::new();
        for route in &self.routes {
            if match_route(route, "", &target, &mut chain) {
                return chain;
            }
        }
        Vec::new()
    }
}

/// Strip query and fragment, collapse the trailing slash. Always starts with `/`.
pub(crate) fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_matches('/');
    format!("/{trimmed}")
}

fn join(parent: &str, segment: &str) -> String {
    let parent = parent.trim_end_matches('/');
    let segment = segment.trim_matches('/');
    if segment.is_empty() {
        if parent.is_empty() { "/".to_owned() } else { parent.to_owned() }
    } else {
        format!("{parent}/{segment}")
    }
}

fn match_route<'a>(route: &'a RouteDef, parent: &str, target: &str, chain: &mut Vec<&'a RouteDef>) -> bool {
    let full = join(parent, route.path);
    chain.push(route);
    if full == target {
        return true;
    }
    for child in &route.children {
        if match_route(child, &full, target, chain) {
            return true;
        }
    }
    chain.pop();
    false
}
