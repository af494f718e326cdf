//! Error types for envelope operations

use thiserror::Error;

/// Errors from encrypting, decrypting or generating keys.
///
/// None of these are retried internally. A failed decrypt is terminal for
/// that call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Encryption was requested with an empty passphrase
    #[error("empty encryption key")]
    EmptyKey,

    /// The supplied key did not unlock the message
    #[error("invalid decryption key")]
    InvalidKey,

    /// Input could not be armor-decoded
    #[error("invalid message")]
    InvalidMessage,

    /// Armor decoded but the packet structure is broken
    #[error("malformed packet: {0}")]
    MalformedPacket(String),

    /// Algorithm or packet version this implementation does not handle
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Modification detection code did not match the decrypted data
    #[error("integrity check failed")]
    IntegrityCheckFailed,

    /// The OS random source failed
    #[error("random source failure: {0}")]
    RandomSource(String),

    /// Reading plaintext or writing ciphertext failed
    #[error("I/O error: {0}")]
    Io(String),
}

impl CryptoError {
    /// Returns true if this error is caused by the key rather than the
    /// message.
    ///
    /// Key errors are what a recipient can fix by entering a different key.
    /// Everything else means the ciphertext or the environment is broken.
    pub fn is_key_error(&self) -> bool {
        matches!(self, Self::EmptyKey | Self::InvalidKey)
    }
}

impl From<std::io::Error> for CryptoError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_errors_are_classified() {
        assert!(CryptoError::EmptyKey.is_key_error());
        assert!(CryptoError::InvalidKey.is_key_error());
        assert!(!CryptoError::InvalidMessage.is_key_error());
        assert!(!CryptoError::IntegrityCheckFailed.is_key_error());
    }

    #[test]
    fn error_display() {
        assert_eq!(CryptoError::EmptyKey.to_string(), "empty encryption key");
        assert_eq!(CryptoError::InvalidKey.to_string(), "invalid decryption key");
        assert_eq!(
            CryptoError::Unsupported("cipher 3".to_string()).to_string(),
            "unsupported: cipher 3"
        );
    }

    #[test]
    fn io_errors_convert() {
        let err: CryptoError = std::io::Error::other("disk gone").into();
        assert_eq!(err, CryptoError::Io("disk gone".to_string()));
    }
}
