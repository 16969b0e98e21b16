use super::*;
use crate::config::ClientConfig;
use crate::net::envelope::Envelope;
use crate::router::history::{NavigationKind, Navigator};
use crate::state::identity::Role;
use crate::state::session::{TOKEN_KEY, USER_KEY};
use crate::storage::{DurableStorage, MemoryStorage};
use crate::test_helpers::{spawn_backend, test_app, test_app_with_config};
use crate::util::translate::Catalog;
use axum::Json;
use axum::http::StatusCode as AxumStatus;
use axum::routing::post;
use serde_json::{Value, json};
use std::time::Duration;

fn credentials() -> Credentials {
    Credentials::new("ana@example.com", "secret")
}

fn signed_in_storage() -> MemoryStorage {
    MemoryStorage::with_items([(TOKEN_KEY, "OLD"), (USER_KEY, r#"{"name":"Old","role":["user"]}"#)])
}

fn login_returns(body: Value) -> axum::Router {
    axum::Router::new().route(
        "/login",
        post(move || {
            let body = body.clone();
            async move { Json(body) }
        }),
    )
}

// =============================================================================
// login
// =============================================================================

#[tokio::test]
async fn login_installs_session() {
    let root = spawn_backend(login_returns(json!({"access_token": "T", "user": {"name": "Ana", "role": ["admin"]}}))).await;
    let t = test_app(&root, MemoryStorage::new());

    let identity = t.app.auth().login(&credentials()).await.unwrap();

    assert!(identity.is_admin());
    assert!(t.app.session().is_authenticated());
    assert!(t.app.session().is_admin());
    assert_eq!(t.storage.get_item(TOKEN_KEY).as_deref(), Some("T"));
    assert_eq!(t.app.client().headers().authorization().as_deref(), Some("Bearer T"));
}

#[tokio::test]
async fn login_reads_nested_envelope_with_custom_token_field() {
    let root = spawn_backend(login_returns(json!({"data": {"token": "T", "user": {"role": "user"}}}))).await;
    let mut config = ClientConfig::new(&root);
    config.shape.envelope = Envelope::Nested;
    config.shape.token_field = "token".to_owned();
    let t = test_app_with_config(&config, MemoryStorage::new());

    let identity = t.app.auth().login(&credentials()).await.unwrap();
    assert!(identity.has_role(&Role::User));
    assert!(!t.app.session().is_admin());
    assert_eq!(t.app.session().token().as_deref(), Some("T"));
}

#[tokio::test]
async fn login_sends_trimmed_email() {
    let api = axum::Router::new().route(
        "/login",
        post(|Json(body): Json<Value>| async move {
            Json(json!({"access_token": "T", "user": {"email": body["email"]}}))
        }),
    );
    let root = spawn_backend(api).await;
    let t = test_app(&root, MemoryStorage::new());

    let identity = t.app.auth().login(&Credentials::new("  ana@example.com  ", "pw")).await.unwrap();
    assert_eq!(identity.extra.get("email"), Some(&json!("ana@example.com")));
}

#[tokio::test]
async fn blank_credentials_never_reach_server() {
    let api = axum::Router::new().route("/login", post(|| async { AxumStatus::INTERNAL_SERVER_ERROR }));
    let root = spawn_backend(api).await;
    let t = test_app(&root, MemoryStorage::new());

    let err = t.app.auth().login(&Credentials::new(" ", "pw")).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials(_)));
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn malformed_response_leaves_session_unchanged() {
    let root = spawn_backend(login_returns(json!({"access_token": "T"}))).await;
    let t = test_app(&root, signed_in_storage());
    let before = t.app.session().snapshot();

    let err = t.app.auth().login(&credentials()).await.unwrap_err();

    assert!(matches!(err, AuthError::MalformedResponse(MissingField::User)));
    assert_eq!(t.app.session().snapshot(), before);
    assert_eq!(t.storage.get_item(TOKEN_KEY).as_deref(), Some("OLD"));
}

#[tokio::test]
async fn rejected_login_surfaces_translated_field_errors() {
    let api = axum::Router::new().route(
        "/login",
        post(|| async {
            (
                AxumStatus::UNPROCESSABLE_ENTITY,
                Json(json!({"errors": {"email": ["validation.email"], "password": "validation.required"}})),
            )
        }),
    );
    let root = spawn_backend(api).await;
    let t = test_app(&root, MemoryStorage::new());

    let err = t.app.auth().login(&credentials()).await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::UNPROCESSABLE_ENTITY));
    let errors = err.field_errors(&Catalog::portuguese());
    assert_eq!(errors.get("E-mail"), Some(&vec!["E-mail inválido".to_owned()]));
    assert_eq!(errors.get("Senha"), Some(&vec!["Campo obrigatório".to_owned()]));
    assert!(!t.app.session().is_authenticated());
}

#[tokio::test]
async fn unauthorized_login_forces_sign_out() {
    let api = axum::Router::new().route(
        "/login",
        post(|| async { (AxumStatus::UNAUTHORIZED, Json(json!({"message": "Invalid credentials"}))) }),
    );
    let root = spawn_backend(api).await;
    let t = test_app(&root, signed_in_storage());

    let err = t.app.auth().login(&credentials()).await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    assert!(!t.app.session().is_authenticated());
    assert!(t.storage.keys().is_empty());
    assert_eq!(t.history.current_path(), "/login");
    assert_eq!(t.history.last_kind(), NavigationKind::Hard);
}

// =============================================================================
// logout
// =============================================================================

#[tokio::test]
async fn logout_clears_session() {
    let api = axum::Router::new().route("/logout", post(|| async { Json(json!({"message": "bye"})) }));
    let root = spawn_backend(api).await;
    let t = test_app(&root, signed_in_storage());
    assert!(t.app.session().is_authenticated());

    t.app.auth().logout().await.unwrap();

    assert!(!t.app.session().is_authenticated());
    assert_eq!(t.storage.get_item(TOKEN_KEY), None);
    assert_eq!(t.storage.get_item(USER_KEY), None);
    assert_eq!(t.app.client().headers().authorization(), None);
}

#[tokio::test]
async fn logout_clears_session_even_when_server_fails() {
    let api = axum::Router::new().route("/logout", post(|| async { AxumStatus::INTERNAL_SERVER_ERROR }));
    let root = spawn_backend(api).await;
    let t = test_app(&root, signed_in_storage());

    let err = t.app.auth().logout().await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert!(!t.app.session().is_authenticated());
    assert_eq!(t.storage.get_item(TOKEN_KEY), None);
}

#[tokio::test]
async fn logout_sends_bearer_then_drops_it() {
    let seen = crate::test_helpers::SeenAuth::default();
    let recorder = seen.clone();
    let api = axum::Router::new().route(
        "/logout",
        post(move |headers: axum::http::HeaderMap| {
            let recorder = recorder.clone();
            async move {
                recorder.record(&headers);
                Json(json!({}))
            }
        }),
    );
    let root = spawn_backend(api).await;
    let t = test_app(&root, signed_in_storage());

    t.app.auth().logout().await.unwrap();
    t.app.auth().logout().await.unwrap();

    assert_eq!(seen.all(), vec![Some("Bearer OLD".to_owned()), None]);
}

// =============================================================================
// ordering
// =============================================================================

#[tokio::test]
async fn stale_login_is_discarded_after_logout() {
    let api = axum::Router::new()
        .route(
            "/login",
            post(|| async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Json(json!({"access_token": "LATE", "user": {"role": ["admin"]}}))
            }),
        )
        .route("/logout", post(|| async { Json(json!({})) }));
    let root = spawn_backend(api).await;
    let t = test_app(&root, MemoryStorage::new());
    let auth = t.app.auth();
    let credentials = credentials();

    let (login, logout) = tokio::join!(auth.login(&credentials), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        auth.logout().await
    });

    logout.unwrap();
    assert!(matches!(login, Err(AuthError::Superseded)));
    assert!(!t.app.session().is_authenticated());
    assert_eq!(t.storage.get_item(TOKEN_KEY), None);
}

#[tokio::test]
async fn later_login_wins_over_slower_earlier_one() {
    let api = axum::Router::new().route(
        "/login",
        post(|Json(body): Json<Value>| async move {
            let slow = body["email"] == "slow@example.com";
            if slow {
                tokio::time::sleep(Duration::from_millis(300)).await;
            }
            let token = if slow { "SLOW" } else { "FAST" };
            Json(json!({"access_token": token, "user": {"email": body["email"]}}))
        }),
    );
    let root = spawn_backend(api).await;
    let t = test_app(&root, MemoryStorage::new());
    let auth = t.app.auth();

    let slow = Credentials::new("slow@example.com", "pw");
    let fast = Credentials::new("fast@example.com", "pw");
    let (first, second) = tokio::join!(auth.login(&slow), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        auth.login(&fast).await
    });

    assert!(matches!(first, Err(AuthError::Superseded)));
    second.unwrap();
    assert_eq!(t.app.session().token().as_deref(), Some("FAST"));
}

#[tokio::test]
async fn slow_logout_still_clears_when_newer_login_fails() {
    let api = axum::Router::new()
        .route(
            "/logout",
            post(|| async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Json(json!({}))
            }),
        )
        .route(
            "/login",
            post(|| async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                (AxumStatus::UNPROCESSABLE_ENTITY, Json(json!({"errors": {"email": ["validation.email"]}})))
            }),
        );
    let root = spawn_backend(api).await;
    let t = test_app(&root, signed_in_storage());
    let auth = t.app.auth();
    let credentials = credentials();

    let (logout, login) = tokio::join!(auth.logout(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        auth.login(&credentials).await
    });

    logout.unwrap();
    assert_eq!(login.unwrap_err().status(), Some(StatusCode::UNPROCESSABLE_ENTITY));
    assert!(!t.app.session().is_authenticated());
    assert_eq!(t.storage.get_item(TOKEN_KEY), None);
    assert_eq!(t.storage.get_item(USER_KEY), None);
    assert_eq!(t.app.client().headers().authorization(), None);
}

#[tokio::test]
async fn slow_logout_keeps_newer_successful_login() {
    let api = axum::Router::new()
        .route(
            "/logout",
            post(|| async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Json(json!({}))
            }),
        )
        .route(
            "/login",
            post(|| async { Json(json!({"access_token": "NEW", "user": {"role": ["admin"]}})) }),
        );
    let root = spawn_backend(api).await;
    let t = test_app(&root, signed_in_storage());
    let auth = t.app.auth();
    let credentials = credentials();

    let (logout, login) = tokio::join!(auth.logout(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        auth.login(&credentials).await
    });

    logout.unwrap();
    assert!(login.unwrap().is_admin());
    assert!(t.app.session().is_admin());
    assert_eq!(t.storage.get_item(TOKEN_KEY).as_deref(), Some("NEW"));
    assert_eq!(t.app.client().headers().authorization().as_deref(), Some("Bearer NEW"));
}

#[tokio::test]
async fn slow_login_applies_when_newer_login_fails() {
    let api = axum::Router::new().route(
        "/login",
        post(|Json(body): Json<Value>| async move {
            if body["email"] == "slow@example.com" {
                tokio::time::sleep(Duration::from_millis(300)).await;
                return (AxumStatus::OK, Json(json!({"access_token": "SLOW", "user": {}})));
            }
            (AxumStatus::INTERNAL_SERVER_ERROR, Json(json!({"message": "Server Error"})))
        }),
    );
    let root = spawn_backend(api).await;
    let t = test_app(&root, MemoryStorage::new());
    let auth = t.app.auth();

    let slow = Credentials::new("slow@example.com", "pw");
    let failing = Credentials::new("fast@example.com", "pw");
    let (first, second) = tokio::join!(auth.login(&slow), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        auth.login(&failing).await
    });

    first.unwrap();
    assert!(second.is_err());
    assert_eq!(t.app.session().token().as_deref(), Some("SLOW"));
}
