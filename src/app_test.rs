use super::*;
use crate::net::api::Credentials;
use crate::router::RouteError;
use crate::router::history::NavigationKind;
use crate::router::routes::RouteName;
use crate::state::session::{TOKEN_KEY, USER_KEY};
use crate::storage::MemoryStorage;
use crate::test_helpers::{SeenAuth, spawn_backend, test_app};
use axum::Json;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use serde_json::json;

fn admin_storage() -> MemoryStorage {
    MemoryStorage::with_items([
        (TOKEN_KEY, "T"),
        (USER_KEY, r#"{"name":"Ana","role":["admin"]}"#),
        ("theme", "dark"),
    ])
}

#[tokio::test]
async fn bootstrap_hydrates_from_storage() {
    let t = test_app("http://127.0.0.1:9/api", admin_storage());
    assert!(t.app.session().is_authenticated());
    assert!(t.app.session().is_admin());
    assert_eq!(t.app.client().headers().authorization().as_deref(), Some("Bearer T"));
    assert_eq!(t.app.router().navigate("/user").unwrap().route, RouteName::User);
}

#[tokio::test]
async fn bootstrap_with_empty_storage_starts_signed_out() {
    let t = test_app("http://127.0.0.1:9/api", MemoryStorage::new());
    assert!(!t.app.session().is_authenticated());
    assert_eq!(t.app.router().navigate("/user").unwrap().route, RouteName::Login);
}

#[tokio::test]
async fn expired_token_on_protected_screen_forces_sign_out() {
    let api = axum::Router::new().route(
        "/users",
        get(|| async { (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthenticated."}))) }),
    );
    let root = spawn_backend(api).await;
    let t = test_app(&root, admin_storage());
    t.app.router().navigate("/user").unwrap();
    assert_eq!(t.app.current_path(), "/user");

    let err = t.app.client().get("/users").await.unwrap_err();

    assert_eq!(err.status(), Some(reqwest::StatusCode::UNAUTHORIZED));
    assert_eq!(err.payload(), Some(&json!({"message": "Unauthenticated."})));
    assert!(!t.app.session().is_authenticated());
    assert!(t.storage.keys().is_empty());
    assert_eq!(t.app.client().headers().authorization(), None);
    assert_eq!(t.app.current_path(), "/login");
    assert_eq!(t.history.last_kind(), NavigationKind::Hard);
    assert_eq!(t.history.hard_loads(), 1);
}

#[tokio::test]
async fn forbidden_does_not_sign_out() {
    let api = axum::Router::new().route("/users", get(|| async { StatusCode::FORBIDDEN }));
    let root = spawn_backend(api).await;
    let t = test_app(&root, admin_storage());

    let err = t.app.client().get("/users").await.unwrap_err();

    assert_eq!(err.status(), Some(reqwest::StatusCode::FORBIDDEN));
    assert!(t.app.session().is_authenticated());
    assert_eq!(t.history.hard_loads(), 0);
}

#[tokio::test]
async fn full_sign_in_browse_sign_out_cycle() {
    let seen = SeenAuth::default();
    let recorder = seen.clone();
    let api = axum::Router::new()
        .route(
            "/login",
            post(|| async { Json(json!({"access_token": "T", "user": {"name": "Ana", "role": ["admin"]}})) }),
        )
        .route(
            "/users",
            get(move |headers: HeaderMap| {
                let recorder = recorder.clone();
                async move {
                    recorder.record(&headers);
                    Json(json!([{"id": 1}]))
                }
            }),
        )
        .route("/logout", post(|| async { Json(json!({})) }));
    let root = spawn_backend(api).await;
    let t = test_app(&root, MemoryStorage::new());

    assert_eq!(t.app.router().navigate("/user").unwrap().route, RouteName::Login);

    t.app.auth().login(&Credentials::new("ana@example.com", "secret")).await.unwrap();
    assert_eq!(t.app.router().navigate("/login").unwrap().route, RouteName::Home);
    assert_eq!(t.app.router().navigate("/user").unwrap().route, RouteName::User);
    t.app.client().get("/users").await.unwrap();

    t.app.auth().logout().await.unwrap();
    t.app.client().get("/users").await.unwrap();
    assert_eq!(t.app.router().navigate("/user").unwrap().route, RouteName::Login);

    assert_eq!(seen.all(), vec![Some("Bearer T".to_owned()), None]);
}

#[tokio::test]
async fn unknown_path_when_signed_in_is_not_found() {
    let t = test_app("http://127.0.0.1:9/api", admin_storage());
    assert_eq!(t.app.router().navigate("/reports"), Err(RouteError::NotFound("/reports".to_owned())));
}
