//! Minimal OpenPGP building blocks for symmetric messages.
//!
//! Only what a passphrase-encrypted, armored message needs: armor, packet
//! framing, string-to-key and AES in OpenPGP CFB mode.

pub mod armor;
pub mod cipher;
pub mod packet;
pub mod s2k;

pub use cipher::{BLOCK_SIZE, CfbDecryptor, CfbEncryptor, SymmetricAlgorithm};
pub use s2k::{HashAlgorithm, StringToKey};
