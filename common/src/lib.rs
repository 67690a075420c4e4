//! Shared types for `relayr`.
//!
//! Everything here is plain data: the directory records handed out by the
//! relay directory, the per-endpoint probe outcome, and the run configuration.
//! No IO happens in this crate.

pub mod config;
pub mod network;
