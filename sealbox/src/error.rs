//! Cryptor error types.

use sealbox_crypto::CryptoError;
use thiserror::Error;

/// Result type for cryptor operations.
pub type CryptorResult<T> = Result<T, CryptorError>;

/// Errors that can occur while building or opening an envelope.
///
/// Every variant is terminal for the current operation. Messages never
/// include key material, passwords or plaintext.
#[derive(Debug, Error)]
pub enum CryptorError {
    #[error("duplicate recipient: {0}")]
    DuplicateRecipient(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("password must not be empty")]
    EmptyPassword,

    #[error("no recipients registered")]
    NoRecipients,

    #[error("recipient not found: {0}")]
    RecipientNotFound(String),

    #[error("failed to unwrap content key: {0}")]
    UnwrapFailure(String),

    #[error("integrity check failed")]
    IntegrityCheckFailed,

    #[error("content info missing")]
    MissingContentInfo,

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("{operation} not allowed in state {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}
