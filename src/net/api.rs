//! Authentication endpoints.
//!
//! Thin wrappers over [`ApiClient`]: they know the paths and request bodies,
//! nothing about sessions. Interpreting the login response is left to
//! [`super::envelope`].

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::fmt;

use serde_json::Value;

use super::client::{ApiClient, ApiError};

pub const LOGIN_ENDPOINT: &str = "/login";
pub const LOGOUT_ENDPOINT: &str = "/logout";

/// Login form contents.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }

    /// Trim the email and require both fields, as the login form does before
    /// submitting.
    ///
    /// # Errors
    ///
    /// Returns the message shown under the form when a field is blank.
    pub fn validated(&self) -> Result<Self, &'static str> {
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() {
            return Err("Enter both email and password.");
        }
        Ok(Self { email: email.to_owned(), password: self.password.clone() })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// `POST /login`, returning the raw response body.
///
/// # Errors
///
/// Propagates transport failures and non-2xx statuses with their payload.
pub async fn post_login(client: &ApiClient, credentials: &Credentials) -> Result<Value, ApiError> {
    let body = serde_json::json!({ "email": credentials.email, "password": credentials.password });
    let response = client.post(LOGIN_ENDPOINT, Some(&body)).await?;
    Ok(response.body)
}

/// `POST /logout`. Only the status matters.
///
/// # Errors
///
/// Propagates transport failures and non-2xx statuses with their payload.
pub async fn post_logout(client: &ApiClient) -> Result<(), ApiError> {
    client.post(LOGOUT_ENDPOINT, None).await.map(|_| ())
}
