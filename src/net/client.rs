//! HTTP client wrapper shared by every API call.
//!
//! ARCHITECTURE
//! ============
//! Requests are sent relative to a fixed API root with a shared set of
//! default headers. The session store arms and disarms the `Authorization`
//! header on that set; the client only reads it. Every response, success or
//! failure, is shown to the registered interceptors before it reaches the
//! caller, and an interceptor may raise a session-invalidated signal that is
//! handed to the configured [`InvalidationSink`].
//!
//! ERROR HANDLING
//! ==============
//! Interceptors observe; they never swallow or rewrite the outcome. A 401 is
//! still returned to the caller as [`ApiError::Status`] after the sink ran.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, InvalidHeaderValue};
use reqwest::{Method, StatusCode};
use serde_json::Value;

use super::interceptor::{Interception, InvalidationSink, ResponseInterceptor, ResponseMeta};
use crate::config::ClientConfig;

/// Build the `Bearer <token>` header value, marked sensitive so it is
/// redacted from `Debug` output.
///
/// # Errors
///
/// Returns an error if the token contains bytes not allowed in a header.
pub fn bearer_value(token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Headers attached to every outgoing request. Clones share one map.
#[derive(Clone, Debug, Default)]
pub struct DefaultHeaders(Arc<RwLock<HeaderMap>>);

impl DefaultHeaders {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_authorization(&self, value: HeaderValue) {
        self.0.write().unwrap_or_else(PoisonError::into_inner).insert(AUTHORIZATION, value);
    }

    /// Drop the header entirely rather than leaving an empty value behind.
    pub fn remove_authorization(&self) {
        self.0.write().unwrap_or_else(PoisonError::into_inner).remove(AUTHORIZATION);
    }

    #[must_use]
    pub fn authorization(&self) -> Option<String> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    }

    #[must_use]
    pub fn snapshot(&self) -> HeaderMap {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("http request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server responded {status}")]
    Status { status: StatusCode, payload: Value },
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Transport(e) => e.status(),
            Self::Status { status, .. } => Some(*status),
        }
    }

    /// The decoded error body sent by the server, if any.
    #[must_use]
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Transport(_) => None,
            Self::Status { payload, .. } => Some(payload),
        }
    }
}

/// A successful response with its body decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Empty bodies decode to `Null`; bodies that are not JSON are kept as a
/// JSON string so error details are never lost.
pub(crate) fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned()))
}

pub struct ApiClient {
    http: reqwest::Client,
    api_root: String,
    headers: DefaultHeaders,
    interceptors: Vec<Arc<dyn ResponseInterceptor>>,
    sink: Option<Arc<dyn InvalidationSink>>,
}

impl ApiClient {
    #[must_use]
    pub fn builder(config: &ClientConfig, headers: DefaultHeaders) -> ApiClientBuilder {
        ApiClientBuilder {
            api_root: config.api_root.trim_end_matches('/').to_owned(),
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
            connect_timeout: Duration::from_secs(config.timeouts.connect_secs),
            headers,
            interceptors: Vec::new(),
            sink: None,
        }
    }

    #[must_use]
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    #[must_use]
    pub fn headers(&self) -> &DefaultHeaders {
        &self.headers
    }

    /// Absolute URL for an API-relative `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_root, path.trim_start_matches('/'))
    }

    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn get(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.send(Method::GET, path, None).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn post(&self, path: &str, body: Option<&Value>) -> Result<ApiResponse, ApiError> {
        self.send(Method::POST, path, body).await
    }

    /// Send a request with the current default headers and run the
    /// interceptors on whatever comes back.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] when no response was received or the
    /// body could not be read, and [`ApiError::Status`] for non-2xx statuses.
    pub async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ApiResponse, ApiError> {
        let mut request = self.http.request(method.clone(), self.url(path)).headers(self.headers.snapshot());
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(%method, path, "api request");
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await;

        self.intercept(&ResponseMeta { method: &method, path, status });

        let body = decode_body(&text?);
        if status.is_success() {
            Ok(ApiResponse { status, body })
        } else {
            tracing::debug!(%method, path, %status, "api request rejected");
            Err(ApiError::Status { status, payload: body })
        }
    }

    /// Every interceptor sees every response; the sink fires at most once.
    fn intercept(&self, meta: &ResponseMeta<'_>) {
        let invalidate = self
            .interceptors
            .iter()
            .map(|interceptor| interceptor.intercept(meta))
            .fold(false, |acc, outcome| acc | (outcome == Interception::InvalidateSession));
        if !invalidate {
            return;
        }
        match &self.sink {
            Some(sink) => sink.session_invalidated(meta),
            None => tracing::warn!(path = meta.path, "session invalidated but no sink is registered"),
        }
    }
}

pub struct ApiClientBuilder {
    api_root: String,
    request_timeout: Duration,
    connect_timeout: Duration,
    headers: DefaultHeaders,
    interceptors: Vec<Arc<dyn ResponseInterceptor>>,
    sink: Option<Arc<dyn InvalidationSink>>,
}

impl ApiClientBuilder {
    #[must_use]
    pub fn interceptor(mut self, interceptor: Arc<dyn ResponseInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    #[must_use]
    pub fn on_invalidation(mut self, sink: Arc<dyn InvalidationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .build()?;
        Ok(ApiClient {
            http,
            api_root: self.api_root,
            headers: self.headers,
            interceptors: self.interceptors,
            sink: self.sink,
        })
    }
}
