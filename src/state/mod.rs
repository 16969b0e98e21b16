//! Client state shared across routing and networking.

pub mod identity;
pub mod session;
