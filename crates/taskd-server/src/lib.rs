//! HTTP surface for the taskd scheduler.
//!
//! Thin request/response plumbing around [`taskd_core`]: an axum router, a
//! bearer-token auth layer, and handlers that translate between JSON bodies
//! and the repository/recurrence APIs. All date decisions live in the core
//! crate; handlers read the clock once per request and pass it down.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod http;
