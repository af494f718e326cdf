//! AES in OpenPGP CFB mode
//!
//! OpenPGP's SEIPD packets and encrypted session keys both use plain CFB with
//! an all-zero IV. The random prefix inside SEIPD plays the role of the IV.

use aes::{Aes128, Aes192, Aes256};
use cfb_mode::{BufDecryptor, BufEncryptor, cipher::KeyIvInit};

use crate::CryptoError;

/// AES block size, shared by every supported algorithm
pub const BLOCK_SIZE: usize = 16;

const ZERO_IV: [u8; BLOCK_SIZE] = [0u8; BLOCK_SIZE];

/// Symmetric algorithms accepted in SKESK and session keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymmetricAlgorithm {
    /// AES with 128-bit key (id 7)
    Aes128,
    /// AES with 192-bit key (id 8)
    Aes192,
    /// AES with 256-bit key (id 9)
    Aes256,
}

impl SymmetricAlgorithm {
    /// Look up an algorithm by its RFC 4880 identifier.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            7 => Some(Self::Aes128),
            8 => Some(Self::Aes192),
            9 => Some(Self::Aes256),
            _ => None,
        }
    }

    /// RFC 4880 identifier.
    pub fn id(self) -> u8 {
        match self {
            Self::Aes128 => 7,
            Self::Aes192 => 8,
            Self::Aes256 => 9,
        }
    }

    /// Key size in bytes.
    pub fn key_size(self) -> usize {
        match self {
            Self::Aes128 => 16,
            Self::Aes192 => 24,
            Self::Aes256 => 32,
        }
    }
}

/// Streaming CFB encryptor with a zero IV.
pub enum CfbEncryptor {
    /// AES-128
    Aes128(BufEncryptor<Aes128>),
    /// AES-192
    Aes192(BufEncryptor<Aes192>),
    /// AES-256
    Aes256(BufEncryptor<Aes256>),
}

impl CfbEncryptor {
    /// Create an encryptor for `algorithm` keyed with `key`.
    pub fn new(algorithm: SymmetricAlgorithm, key: &[u8]) -> Result<Self, CryptoError> {
        let invalid = |_| CryptoError::MalformedPacket(format!("bad key length {}", key.len()));
        Ok(match algorithm {
            SymmetricAlgorithm::Aes128 => {
                Self::Aes128(BufEncryptor::new_from_slices(key, &ZERO_IV).map_err(invalid)?)
            },
            SymmetricAlgorithm::Aes192 => {
                Self::Aes192(BufEncryptor::new_from_slices(key, &ZERO_IV).map_err(invalid)?)
            },
            SymmetricAlgorithm::Aes256 => {
                Self::Aes256(BufEncryptor::new_from_slices(key, &ZERO_IV).map_err(invalid)?)
            },
        })
    }

    /// Encrypt `data` in place, continuing the keystream from the last call.
    pub fn apply(&mut self, data: &mut [u8]) {
        match self {
            Self::Aes128(c) => c.encrypt(data),
            Self::Aes192(c) => c.encrypt(data),
            Self::Aes256(c) => c.encrypt(data),
        }
    }
}

/// Streaming CFB decryptor with a zero IV.
pub enum CfbDecryptor {
    /// AES-128
    Aes128(BufDecryptor<Aes128>),
    /// AES-192
    Aes192(BufDecryptor<Aes192>),
    /// AES-256
    Aes256(BufDecryptor<Aes256>),
}

impl CfbDecryptor {
    /// Create a decryptor for `algorithm` keyed with `key`.
    pub fn new(algorithm: SymmetricAlgorithm, key: &[u8]) -> Result<Self, CryptoError> {
        let invalid = |_| CryptoError::MalformedPacket(format!("bad key length {}", key.len()));
        Ok(match algorithm {
            SymmetricAlgorithm::Aes128 => {
                Self::Aes128(BufDecryptor::new_from_slices(key, &ZERO_IV).map_err(invalid)?)
            },
            SymmetricAlgorithm::Aes192 => {
                Self::Aes192(BufDecryptor::new_from_slices(key, &ZERO_IV).map_err(invalid)?)
            },
            SymmetricAlgorithm::Aes256 => {
                Self::Aes256(BufDecryptor::new_from_slices(key, &ZERO_IV).map_err(invalid)?)
            },
        })
    }

    /// Decrypt `data` in place, continuing the keystream from the last call.
    pub fn apply(&mut self, data: &mut [u8]) {
        match self {
            Self::Aes128(c) => c.decrypt(data),
            Self::Aes192(c) => c.decrypt(data),
            Self::Aes256(c) => c.decrypt(data),
        }
    }
}
