//! Aura HTTP API server library.
//!
//! Exposes configuration, state, error handling, routes and the startup
//! helpers so integration tests and the binary entrypoint share them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod model_store;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
