//! # relayr core
//!
//! The probing pipeline, one module per stage:
//!
//! * **[`directory`]**: fetches the relay directory, or serves it from a local cache
//!   while it is still fresh.
//! * **[`filter`]**: narrows the directory down with attribute predicates.
//! * **[`prober`]**: measures one round trip per endpoint on a bounded worker pool.
//! * **[`ranker`]**: orders the measurements and renders them as a table.
//!
//! Each stage consumes the complete output of the previous one.

pub mod directory;
pub mod error;
pub mod filter;
pub mod prober;
pub mod ranker;
