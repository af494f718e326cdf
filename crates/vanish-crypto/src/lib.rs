//! Client-side encryption for vanish secrets.
//!
//! Secrets are encrypted before they leave the sender and decrypted after
//! they reach the recipient. The server only ever stores the armored
//! ciphertext produced here.
//!
//! # Envelope format
//!
//! An envelope is an ASCII-armored OpenPGP message (RFC 4880) encrypted with
//! a passphrase: one symmetric-key session key packet (AES-256, iterated and
//! salted SHA-256 S2K) followed by an integrity-protected data packet holding
//! a literal data packet. Browser OpenPGP implementations read and write the
//! same format.
//!
//! # Key attempts
//!
//! [`decrypt`] tries the supplied key exactly once. The key is handed to the
//! packet decryptor through a [`OneShotKey`], which refuses a second request,
//! so a wrong key yields a single [`CryptoError::InvalidKey`] and never a
//! loop over candidates.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod envelope;
pub mod error;
pub mod openpgp;

pub use envelope::{
    Decrypted, EnvelopeRandomness, FileHints, KEY_LENGTH, OneShotKey, decrypt, encrypt,
    encrypt_file, encrypt_with_hints, encrypt_with_randomness, generate_key,
};
pub use error::CryptoError;
