//! In-process mock backend and wiring shared by async tests.

use std::sync::{Arc, Mutex, PoisonError};

use axum::Router;
use axum::http::HeaderMap;

use crate::app::App;
use crate::config::ClientConfig;
use crate::router::history::History;
use crate::storage::MemoryStorage;

/// Serve `api` under `/api` on an ephemeral port and return the API root.
pub async fn spawn_backend(api: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind mock backend");
    let addr = listener.local_addr().expect("mock backend addr");
    let app = Router::new().nest("/api", api);
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock backend crashed");
    });
    format!("http://{addr}/api")
}

/// `Authorization` header values seen by a mock endpoint, in arrival order.
#[derive(Clone, Default)]
pub struct SeenAuth(Arc<Mutex<Vec<Option<String>>>>);

impl SeenAuth {
    pub fn record(&self, headers: &HeaderMap) {
        let value = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push(value);
    }

    pub fn all(&self) -> Vec<Option<String>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

pub struct TestApp {
    pub app: App,
    pub storage: Arc<MemoryStorage>,
    pub history: Arc<History>,
}

pub fn test_app(api_root: &str, storage: MemoryStorage) -> TestApp {
    test_app_with_config(&ClientConfig::new(api_root), storage)
}

pub fn test_app_with_config(config: &ClientConfig, storage: MemoryStorage) -> TestApp {
    let storage = Arc::new(storage);
    let history = Arc::new(History::default());
    let app = App::bootstrap(config, storage.clone(), history.clone()).expect("bootstrap test app");
    TestApp { app, storage, history }
}
