//! Hotel booking backend library
//!
//! Exposes the router, storage and auth layers for the binary and for
//! integration tests.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
