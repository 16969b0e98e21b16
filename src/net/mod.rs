//! Networking modules for the REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `client` owns request dispatch and default headers, `interceptor` the
//! response hooks and forced sign-out, `envelope` the login response
//! contract, and `api` the authentication endpoints.

pub mod api;
pub mod client;
pub mod envelope;
pub mod interceptor;
