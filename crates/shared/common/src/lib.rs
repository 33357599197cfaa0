//! Common utilities shared by the repository crates.
//!
//! This crate provides:
//! - Unified error handling for provisioning, queries and writes
//! - Configuration sources and the well-known setting keys

pub mod config;
pub mod error;

pub use config::*;
pub use error::{OptionExt, RepoError, RepoResult};
