use thiserror::Error;

use crate::device::InventoryError;
use crate::types::Strategy;

/// Errors from identifier generation, signature encoding and decoding.
#[derive(Debug, Error)]
pub enum Error {
    /// The output buffer cannot hold every identifier. Nothing was written.
    #[error("buffer too small: {required} identifiers required, capacity is {capacity}")]
    BufferTooSmall { required: usize, capacity: usize },

    #[error("strategy '{0}' cannot generate identifiers")]
    UnsupportedStrategy(Strategy),

    #[error("no hardware available to derive identifiers with strategy '{0}'")]
    NoIdentifiers(Strategy),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Signature(#[from] SignatureError),
}

impl Error {
    pub fn is_buffer_too_small(&self) -> bool {
        matches!(self, Error::BufferTooSmall { .. })
    }

    /// Unsupported strategy or nothing to identify the machine with.
    pub fn is_generic(&self) -> bool {
        matches!(self, Error::UnsupportedStrategy(_) | Error::NoIdentifiers(_))
    }
}

/// A signature string that does not have the `XXXX-XXXX-XXXX-XXXX` shape.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature must be {expected} characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("expected '-' at position {0}")]
    MissingSeparator(usize),

    #[error("invalid character '{character}' at position {position}")]
    InvalidCharacter { character: char, position: usize },

    #[error("signature payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("signature decodes to {0} bytes, two identifiers need 12")]
    Truncated(usize),
}
