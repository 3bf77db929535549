//! homebase, a self-hosted personal dashboard behind multi-user token auth.
//!
//! The crate is organized around a small authentication core:
//! - [`auth`]: password hashing, session token codec, and the auth service
//! - [`store`]: single-writer SQLite persistence for accounts and resources
//! - [`gateway`]: the axum HTTP surface, request authentication, and handlers
//! - [`config`]: process configuration
//! - [`error`]: the request-boundary error taxonomy

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod store;
