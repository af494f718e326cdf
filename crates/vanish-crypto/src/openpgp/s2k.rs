//! String-to-key derivation (RFC 4880 §3.7)
//!
//! Turns a passphrase into symmetric key material. Output longer than one
//! digest is produced by running extra hash contexts preloaded with zero
//! octets.

use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

use super::packet::ByteReader;
use crate::CryptoError;

/// Salt length for salted specifiers
pub const SALT_SIZE: usize = 8;

/// Coded iteration count used when encrypting (65536 octets)
pub const DEFAULT_COUNT: u8 = 0x60;

/// Hash used when encrypting
pub const DEFAULT_HASH: HashAlgorithm = HashAlgorithm::Sha256;

/// Hash algorithms accepted inside S2K specifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    /// SHA-1 (id 2)
    Sha1,
    /// SHA-256 (id 8)
    Sha256,
    /// SHA-384 (id 9)
    Sha384,
    /// SHA-512 (id 10)
    Sha512,
    /// SHA-224 (id 11)
    Sha224,
}

impl HashAlgorithm {
    fn from_id(id: u8) -> Result<Self, CryptoError> {
        match id {
            2 => Ok(Self::Sha1),
            8 => Ok(Self::Sha256),
            9 => Ok(Self::Sha384),
            10 => Ok(Self::Sha512),
            11 => Ok(Self::Sha224),
            other => Err(CryptoError::Unsupported(format!("S2K hash algorithm {other}"))),
        }
    }

    fn id(self) -> u8 {
        match self {
            Self::Sha1 => 2,
            Self::Sha256 => 8,
            Self::Sha384 => 9,
            Self::Sha512 => 10,
            Self::Sha224 => 11,
        }
    }
}

/// A parsed S2K specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringToKey {
    /// Type 0: hash of the passphrase
    Simple {
        /// Digest algorithm
        hash: HashAlgorithm,
    },
    /// Type 1: hash of salt and passphrase
    Salted {
        /// Digest algorithm
        hash: HashAlgorithm,
        /// Random salt
        salt: [u8; SALT_SIZE],
    },
    /// Type 3: salt and passphrase hashed repeatedly up to a byte count
    IteratedSalted {
        /// Digest algorithm
        hash: HashAlgorithm,
        /// Random salt
        salt: [u8; SALT_SIZE],
        /// Coded octet count
        count: u8,
    },
}

impl StringToKey {
    /// The specifier written by `encrypt`.
    pub fn iterated(salt: [u8; SALT_SIZE]) -> Self {
        Self::IteratedSalted { hash: DEFAULT_HASH, salt, count: DEFAULT_COUNT }
    }

    /// Parse a specifier from the front of `reader`.
    pub fn parse(reader: &mut ByteReader<'_>) -> Result<Self, CryptoError> {
        let kind = reader.u8()?;
        let hash = HashAlgorithm::from_id(reader.u8()?)?;
        match kind {
            0 => Ok(Self::Simple { hash }),
            1 => Ok(Self::Salted { hash, salt: read_salt(reader)? }),
            3 => {
                let salt = read_salt(reader)?;
                let count = reader.u8()?;
                Ok(Self::IteratedSalted { hash, salt, count })
            },
            other => Err(CryptoError::Unsupported(format!("S2K type {other}"))),
        }
    }

    /// Append the wire form to `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        match self {
            Self::Simple { hash } => out.extend_from_slice(&[0, hash.id()]),
            Self::Salted { hash, salt } => {
                out.extend_from_slice(&[1, hash.id()]);
                out.extend_from_slice(salt);
            },
            Self::IteratedSalted { hash, salt, count } => {
                out.extend_from_slice(&[3, hash.id()]);
                out.extend_from_slice(salt);
                out.push(*count);
            },
        }
    }

    /// Derive `key_size` bytes of key material from `passphrase`.
    pub fn derive_key(&self, passphrase: &[u8], key_size: usize) -> Zeroizing<Vec<u8>> {
        match self.hash() {
            HashAlgorithm::Sha1 => self.derive_with::<Sha1>(passphrase, key_size),
            HashAlgorithm::Sha256 => self.derive_with::<Sha256>(passphrase, key_size),
            HashAlgorithm::Sha384 => self.derive_with::<Sha384>(passphrase, key_size),
            HashAlgorithm::Sha512 => self.derive_with::<Sha512>(passphrase, key_size),
            HashAlgorithm::Sha224 => self.derive_with::<Sha224>(passphrase, key_size),
        }
    }

    fn hash(&self) -> HashAlgorithm {
        match self {
            Self::Simple { hash } | Self::Salted { hash, .. } | Self::IteratedSalted { hash, .. } => {
                *hash
            },
        }
    }

    fn derive_with<D: Digest>(&self, passphrase: &[u8], key_size: usize) -> Zeroizing<Vec<u8>> {
        let mut key = Zeroizing::new(Vec::with_capacity(key_size));
        let mut preload = 0usize;

        while key.len() < key_size {
            let mut hasher = D::new();
            hasher.update(vec![0u8; preload]);

            match self {
                Self::Simple { .. } => hasher.update(passphrase),
                Self::Salted { salt, .. } => {
                    hasher.update(salt);
                    hasher.update(passphrase);
                },
                Self::IteratedSalted { salt, count, .. } => {
                    let mut material = Zeroizing::new(Vec::with_capacity(SALT_SIZE + passphrase.len()));
                    material.extend_from_slice(salt);
                    material.extend_from_slice(passphrase);
                    let total = decode_count(*count).max(material.len());
                    hash_repeated(&mut hasher, &material, total);
                },
            }

            key.extend_from_slice(&hasher.finalize());
            preload += 1;
        }

        key.truncate(key_size);
        key
    }
}

/// Expand a coded iteration count into an octet count.
pub fn decode_count(coded: u8) -> usize {
    (16 + usize::from(coded & 15)) << ((coded >> 4) + 6)
}

fn read_salt(reader: &mut ByteReader<'_>) -> Result<[u8; SALT_SIZE], CryptoError> {
    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(reader.take(SALT_SIZE)?);
    Ok(salt)
}

/// Feed `total` octets of `material` repeated end to end into `hasher`.
///
/// Batches the repetitions into a larger buffer so the digest sees few, big
/// updates instead of one per repetition.
fn hash_repeated<D: Digest>(hasher: &mut D, material: &[u8], total: usize) {
    if material.is_empty() {
        return;
    }

    let reps_per_chunk = (8192 / material.len()).max(1);
    let mut chunk = Zeroizing::new(Vec::with_capacity(reps_per_chunk * material.len()));
    for _ in 0..reps_per_chunk {
        chunk.extend_from_slice(material);
    }

    let mut remaining = total;
    while remaining >= chunk.len() {
        hasher.update(chunk.as_slice());
        remaining -= chunk.len();
    }
    hasher.update(&chunk[..remaining]);
}
