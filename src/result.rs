//! Crate-wide result type.
//!
//! Every fallible operation in castoff returns this `Result`, keeping the
//! error surface to the single error-kind enum defined in [`crate::error`].

use crate::error::Error;

/// Standard result type used throughout castoff.
pub type Result<T> = std::result::Result<T, Error>;
