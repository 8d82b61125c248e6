//! Error type

use core::fmt::{self, Display};

/// Decoding failures. Arithmetic itself never fails.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The bytes are not the encoding of any Edwards25519 point.
    InvalidPoint,
    /// The bytes are not the canonical encoding of a Ristretto255 element.
    InvalidRistretto,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidPoint => f.write_str("invalid edwards25519 point encoding"),
            Error::InvalidRistretto => {
                f.write_str("invalid ristretto255 element encoding")
            },
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
