//! Common error types for FinVault.

use thiserror::Error;

/// Top-level error type for FinVault operations.
///
/// Cryptographic failures are terminal for the operation that raised them:
/// there is no fallback path and no partial plaintext is ever released.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid input provided (empty PIN, empty identifier, bad parameters).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Wrong PIN or biometric factor: unwrapping the master key failed.
    ///
    /// Deliberately indistinguishable from a corrupted wrapped-key envelope
    /// so callers cannot use the error as a decryption oracle.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Ciphertext, tag, or associated data was tampered with or corrupted.
    #[error("Integrity check failed: {0}")]
    Integrity(String),

    /// Envelope version or algorithm is not understood by this build.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Serialized envelope is truncated or otherwise unparseable.
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Operation requires a master key but the session is locked.
    #[error("Key not available: {0}")]
    KeyNotFound(String),

    /// Profile record is missing or too corrupt to use.
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// Profile already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Message suitable for showing to an end user.
    ///
    /// `Authentication` and `Integrity` share one message so that a wrong
    /// PIN and tampered data are not distinguishable at the UI boundary.
    /// The variants stay distinct internally for logging.
    pub fn user_message(&self) -> &'static str {
        match self {
            Error::Authentication(_) | Error::Integrity(_) => "could not unlock",
            Error::InvalidInput(_) => "invalid input",
            Error::UnsupportedFormat(_) | Error::MalformedEnvelope(_) => "unreadable data",
            Error::KeyNotFound(_) => "session is locked",
            Error::ProfileNotFound(_) => "profile not found",
            Error::AlreadyExists(_) => "already exists",
            Error::Storage(_) | Error::Serialization(_) | Error::Io(_) => "internal error",
        }
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_and_integrity_share_user_message() {
        let auth = Error::Authentication("wrong pin".to_string());
        let tamper = Error::Integrity("tag mismatch".to_string());

        assert_eq!(auth.user_message(), tamper.user_message());
    }

    #[test]
    fn test_internal_messages_stay_distinct() {
        let auth = Error::Authentication("wrong pin".to_string());
        let tamper = Error::Integrity("tag mismatch".to_string());

        assert_ne!(auth.to_string(), tamper.to_string());
    }
}
