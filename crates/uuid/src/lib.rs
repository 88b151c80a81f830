//! UUID identity and sharded-path utilities.
//!
//! Image records are identified by a UUID that is always stored and compared in its
//! *canonical* form: **32 lowercase hexadecimal characters** (no hyphens).
//!
//! This crate provides:
//! - [`ShardableUuid`], a wrapper that guarantees the canonical format once constructed.
//! - Shared sharding logic to derive storage locations from an identifier.
//! - [`UuidSource`], the seam through which stores obtain fresh identifiers.
//!
//! ## Canonical UUID form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Non-canonical values (uppercase, hyphenated, wrong length, non-hex) are rejected by
//! [`ShardableUuid::parse`].
//!
//! ## Sharded directory layout
//! For a canonical UUID `u`, data lives under:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>`

mod service;

pub use service::{RandomUuidSource, ShardableUuid, Uuid, UuidSource};

/// Error type for UUID operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for UUID operations.
pub type UuidResult<T> = Result<T, UuidError>;
