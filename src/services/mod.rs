//! Client services that orchestrate networking and state.

pub mod auth;
