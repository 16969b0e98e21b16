//! Client-side authentication and route guarding for the user-management
//! console.
//!
//! The session store ([`state::session`]) is the only shared mutable state.
//! The HTTP client ([`net::client`]) reads its bearer header, the router
//! ([`router`]) reads its predicates, and the login/logout flow
//! ([`services::auth`]) and forced sign-out ([`net::interceptor`]) are the
//! only writers. [`app::App`] wires them together.

pub mod app;
pub mod config;
pub mod net;
pub mod router;
pub mod services;
pub mod state;
pub mod storage;
pub mod util;

#[cfg(test)]
pub(crate) mod test_helpers;
