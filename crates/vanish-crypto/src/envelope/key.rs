//! Share keys and the one-shot key provider

use base64::{Engine as _, engine::general_purpose::URL_SAFE};

use super::fill;
use crate::CryptoError;

/// Length of a generated share key in characters
pub const KEY_LENGTH: usize = 22;

/// Generate a random URL-safe share key of [`KEY_LENGTH`] characters.
///
/// 22 random bytes are base64url-encoded and the encoding is cut to 22
/// characters, leaving 132 bits of entropy.
///
/// # Errors
///
/// [`CryptoError::RandomSource`] if the OS random source fails.
pub fn generate_key() -> Result<String, CryptoError> {
    let mut bytes = [0u8; KEY_LENGTH];
    fill(&mut bytes)?;
    let mut encoded = URL_SAFE.encode(bytes);
    encoded.truncate(KEY_LENGTH);
    Ok(encoded)
}

/// Hands out a decryption key exactly once.
///
/// Every call after the first fails with [`CryptoError::InvalidKey`]. The
/// decryptor asks once per session key packet, so a wrong key ends the call
/// after a single attempt no matter how many packets the message carries.
#[derive(Debug)]
pub struct OneShotKey<'a> {
    key: &'a [u8],
    used: bool,
}

impl<'a> OneShotKey<'a> {
    /// Wrap `key` for a single use.
    pub fn new(key: &'a [u8]) -> Self {
        Self { key, used: false }
    }

    /// Return the key on the first call and `InvalidKey` afterwards.
    pub fn provide(&mut self) -> Result<&'a [u8], CryptoError> {
        if self.used {
            return Err(CryptoError::InvalidKey);
        }
        self.used = true;
        Ok(self.key)
    }

    /// True once the key has been handed out.
    pub fn is_spent(&self) -> bool {
        self.used
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provides_once() {
        let mut key = OneShotKey::new(b"secret");
        assert!(!key.is_spent());
        assert_eq!(key.provide(), Ok(&b"secret"[..]));
        assert!(key.is_spent());
        assert_eq!(key.provide(), Err(CryptoError::InvalidKey));
        assert_eq!(key.provide(), Err(CryptoError::InvalidKey));
    }

    #[test]
    fn generated_key_shape() {
        let key = generate_key().unwrap();
        assert_eq!(key.len(), KEY_LENGTH);
        assert!(key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
    }
}
