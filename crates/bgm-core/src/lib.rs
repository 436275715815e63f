//! # bgm Core
//!
//! Core types, identifiers and errors shared by the bgm crates.
//!
//! This crate holds the vocabulary of the session-log tooling: the values
//! that come out of replaying a browser session log and the values needed to
//! write new records into one.
//!
//! ## Key Types
//!
//! - [`GroupToken`]: 128-bit identifier of a tab group
//! - [`TabGroupColor`]: the nine colors a tab group can carry
//! - [`TabGroup`] / [`Tab`]: the materialized view of a session's groups
//! - [`IdSource`]: seam for generating tab/window ids and group tokens

pub mod error;
pub mod group;
pub mod ids;
pub mod token;

// Re-export main types
pub use error::*;
pub use group::*;
pub use ids::*;
pub use token::*;
