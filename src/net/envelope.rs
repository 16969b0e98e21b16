//! Normalization of the authentication response envelope.
//!
//! Backends disagree on two details of the login response: whether the
//! payload sits at the top level or inside a `data` object, and whether the
//! token is called `access_token` or `token`. Both are configuration, and
//! this module is the only place that looks at the raw body.

#[cfg(test)]
#[path = "envelope_test.rs"]
mod envelope_test;

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::state::identity::Identity;

pub const DEFAULT_TOKEN_FIELD: &str = "access_token";
const USER_FIELD: &str = "user";
const DATA_FIELD: &str = "data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Envelope {
    /// Fields at the top level only.
    Flat,
    /// Fields inside `data` only.
    Nested,
    /// Each field looked up at the top level first, then inside `data`.
    #[default]
    Auto,
}

impl FromStr for Envelope {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(Self::Flat),
            "nested" => Ok(Self::Nested),
            "auto" => Ok(Self::Auto),
            other => Err(format!("unknown envelope '{other}' (expected 'auto', 'flat' or 'nested')")),
        }
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Flat => "flat",
            Self::Nested => "nested",
            Self::Auto => "auto",
        })
    }
}

/// Active response contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseShape {
    pub envelope: Envelope,
    pub token_field: String,
}

impl Default for ResponseShape {
    fn default() -> Self {
        Self { envelope: Envelope::Auto, token_field: DEFAULT_TOKEN_FIELD.to_owned() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Token,
    User,
    TokenAndUser,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Token => "token",
            Self::User => "user",
            Self::TokenAndUser => "token and user",
        })
    }
}

/// Credentials extracted from a successful login response.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthPayload {
    pub token: String,
    pub identity: Identity,
}

/// Extract token and identity from a login response body.
///
/// Empty tokens and users that are not objects (or do not decode) count as
/// missing.
///
/// # Errors
///
/// Returns which of the two fields could not be found.
pub fn normalize_auth_response(body: &Value, shape: &ResponseShape) -> Result<AuthPayload, MissingField> {
    let token = lookup(body, shape.envelope, &shape.token_field)
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_owned);
    let identity = lookup(body, shape.envelope, USER_FIELD)
        .filter(|u| u.is_object())
        .and_then(|u| serde_json::from_value::<Identity>(u.clone()).ok());

    match (token, identity) {
        (Some(token), Some(identity)) => Ok(AuthPayload { token, identity }),
        (None, Some(_)) => Err(MissingField::Token),
        (Some(_), None) => Err(MissingField::User),
        (None, None) => Err(MissingField::TokenAndUser),
    }
}

/// Null, `false` and `""` count as absent so `Auto` can fall through to `data`.
fn lookup<'a>(body: &'a Value, envelope: Envelope, field: &str) -> Option<&'a Value> {
    let present = |v: &&Value| !matches!(v, Value::Null | Value::Bool(false)) && v.as_str() != Some("");
    let flat = move || body.get(field).filter(present);
    let nested = move || body.get(DATA_FIELD).and_then(|d| d.get(field)).filter(present);
    match envelope {
        Envelope::Flat => flat(),
        Envelope::Nested => nested(),
        Envelope::Auto => flat().or_else(nested),
    }
}
