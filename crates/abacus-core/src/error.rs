//! Error types for `abacus-core`.
//!
//! Lookups never fail: unknown levels and features resolve to conservative
//! defaults. The variants here cover configuration that is malformed at
//! construction time.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid level ladder: {0}")]
  InvalidLadder(String),

  #[error("video category {0:?} has no levels")]
  EmptyCategory(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
