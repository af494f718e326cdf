//! Symmetric envelope: armored, passphrase-encrypted OpenPGP messages.
//!
//! Encryption uses a fixed profile (AES-256, SHA-256 S2K, no compression)
//! so browser implementations of the same format can read the output.
//! Decryption makes exactly one key attempt per call, see [`OneShotKey`].

mod decrypt;
mod encrypt;
mod key;

use std::time::UNIX_EPOCH;
use std::{fs, path::Path};

pub use decrypt::decrypt;
pub use encrypt::{encrypt, encrypt_file, encrypt_with_hints, encrypt_with_randomness};
pub use key::{KEY_LENGTH, OneShotKey, generate_key};
use zeroize::Zeroizing;

use crate::{CryptoError, openpgp::s2k::SALT_SIZE};

/// Comment header written into every armored envelope
pub const ARMOR_COMMENT: &str = "https://github.com/vanish-secrets/vanish";

/// Session key size for AES-256
pub const SESSION_KEY_SIZE: usize = 32;

/// Random prefix size inside SEIPD (one AES block)
pub const PREFIX_SIZE: usize = 16;

/// Plaintext recovered from an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decrypted {
    /// Decrypted payload
    pub content: Vec<u8>,
    /// Original file name, present only when the sender marked the payload as
    /// a binary file
    pub filename: Option<String>,
}

/// Metadata describing a file payload.
///
/// Presence of hints marks the payload as binary. Receivers use that flag to
/// decide between writing a file and printing text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHints {
    /// Base name of the file, without directories
    pub filename: String,
    /// Modification time in seconds since the Unix epoch
    pub modified: u32,
}

impl FileHints {
    /// Build hints from a file's name and metadata.
    pub fn from_path(path: &Path) -> Result<Self, CryptoError> {
        let metadata = fs::metadata(path)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let modified = metadata
            .modified()
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |since| u32::try_from(since.as_secs()).unwrap_or(u32::MAX));
        Ok(Self { filename, modified })
    }
}

/// Random material consumed by one encryption.
///
/// Drawn from the OS by default. Tests inject fixed values through
/// [`encrypt_with_randomness`] to get reproducible ciphertext.
pub struct EnvelopeRandomness {
    /// S2K salt
    pub salt: [u8; SALT_SIZE],
    /// Session key for the SEIPD packet
    pub session_key: Zeroizing<[u8; SESSION_KEY_SIZE]>,
    /// SEIPD random prefix
    pub prefix: [u8; PREFIX_SIZE],
}

impl EnvelopeRandomness {
    /// Fill every field from the OS random source.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut randomness = Self {
            salt: [0u8; SALT_SIZE],
            session_key: Zeroizing::new([0u8; SESSION_KEY_SIZE]),
            prefix: [0u8; PREFIX_SIZE],
        };
        fill(&mut randomness.salt)?;
        fill(randomness.session_key.as_mut_slice())?;
        fill(&mut randomness.prefix)?;
        Ok(randomness)
    }
}

pub(crate) fn fill(buf: &mut [u8]) -> Result<(), CryptoError> {
    getrandom::fill(buf).map_err(|err| CryptoError::RandomSource(err.to_string()))
}
