use super::*;
use crate::router::routes::RouteTable;
use crate::state::identity::Identity;

fn anonymous() -> Session {
    Session::default()
}

fn signed_in(roles: &[&str]) -> Session {
    Session { token: Some("T".into()), identity: Identity::with_roles(None, roles.iter().copied()) }
}

fn verdict(path: &str, session: &Session) -> Verdict {
    let table = RouteTable::standard();
    evaluate(&table.resolve(path), session)
}

#[test]
fn anonymous_is_sent_to_login_from_protected_routes() {
    for path in ["/", "/user"] {
        assert_eq!(verdict(path, &anonymous()), Verdict::Redirect(RouteName::Login), "{path}");
    }
}

#[test]
fn anonymous_may_enter_public_routes() {
    assert_eq!(verdict("/login", &anonymous()), Verdict::Allow);
    assert_eq!(verdict("/unauthorized", &anonymous()), Verdict::Allow);
}

#[test]
fn unknown_path_requires_authentication() {
    assert_eq!(verdict("/reports", &anonymous()), Verdict::Redirect(RouteName::Login));
    assert_eq!(verdict("/reports", &signed_in(&["user"])), Verdict::Allow);
}

#[test]
fn signed_in_user_is_bounced_off_login() {
    assert_eq!(verdict("/login", &signed_in(&["user"])), Verdict::Redirect(RouteName::Home));
}

#[test]
fn signed_in_user_may_view_unauthorized_notice() {
    assert_eq!(verdict("/unauthorized", &signed_in(&["user"])), Verdict::Allow);
}

#[test]
fn non_admin_is_sent_to_unauthorized() {
    assert_eq!(verdict("/user", &signed_in(&["user"])), Verdict::Redirect(RouteName::Unauthorized));
    assert_eq!(verdict("/user", &signed_in(&[])), Verdict::Redirect(RouteName::Unauthorized));
}

#[test]
fn admin_may_enter_user_screen() {
    assert_eq!(verdict("/user", &signed_in(&["admin"])), Verdict::Allow);
    assert_eq!(verdict("/user", &signed_in(&["user", "admin"])), Verdict::Allow);
}

#[test]
fn role_names_are_not_substring_matched() {
    assert_eq!(verdict("/user", &signed_in(&["superadmin"])), Verdict::Redirect(RouteName::Unauthorized));
}

#[test]
fn entry_guard_without_authentication_goes_to_login() {
    let table = RouteTable::standard();
    let chain = table.resolve("/user");
    assert_eq!(route_entry_guard(chain[1], &anonymous()), Verdict::Redirect(RouteName::Login));
    assert_eq!(route_entry_guard(chain[0], &anonymous()), Verdict::Allow);
}

#[test]
fn global_guard_on_unknown_leaf() {
    assert_eq!(global_guard(None, &anonymous()), Verdict::Redirect(RouteName::Login));
    assert_eq!(global_guard(None, &signed_in(&[])), Verdict::Allow);
}
