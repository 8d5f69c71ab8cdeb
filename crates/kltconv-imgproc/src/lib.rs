#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for the filtering module.
pub mod error;

/// image filtering module.
pub mod filter;

pub use error::FilterError;
