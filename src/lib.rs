//! Library crate for pub-golf-back, exposing modules for binaries and tests.

/// Configuration file and environment loading.
pub mod config;
/// Storage layer: raw entities and the score store backends.
pub mod dao;
/// Payloads exchanged over REST and SSE.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
pub mod leaderboard;
/// HTTP routers.
pub mod routes;
/// Business logic between routes and storage.
pub mod services;
/// Shared application state.
pub mod state;
