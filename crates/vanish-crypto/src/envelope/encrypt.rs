//! Envelope encryption

use std::{
    fs::File,
    io::{self, Read, Write},
    path::Path,
};

use sha1::{Digest, Sha1};

use super::{ARMOR_COMMENT, EnvelopeRandomness, FileHints};
use crate::{
    CryptoError,
    openpgp::{
        CfbEncryptor, StringToKey, SymmetricAlgorithm,
        armor::ArmorWriter,
        packet::{self, PartialBodyWriter, TAG_LITERAL, TAG_SEIPD, TAG_SKESK},
    },
};

const SKESK_VERSION: u8 = 4;
const SEIPD_VERSION: u8 = 1;
const CIPHER: SymmetricAlgorithm = SymmetricAlgorithm::Aes256;

/// MDC packet header as it appears inside the encrypted stream
const MDC_HEADER: [u8; 2] = [0xD3, 0x14];

/// Encrypt `plaintext` as text with `key`.
///
/// The reader is streamed through the cipher; only the armored output is
/// held in memory.
///
/// # Errors
///
/// [`CryptoError::EmptyKey`] for an empty key, [`CryptoError::Io`] when
/// reading `plaintext` fails.
pub fn encrypt<R: Read>(plaintext: R, key: &str) -> Result<String, CryptoError> {
    encrypt_with_hints(plaintext, key, None)
}

/// Encrypt the file at `path`, embedding its name and modification time.
pub fn encrypt_file(path: &Path, key: &str) -> Result<String, CryptoError> {
    if key.is_empty() {
        return Err(CryptoError::EmptyKey);
    }
    let hints = FileHints::from_path(path)?;
    let file = File::open(path)?;
    encrypt_with_hints(file, key, Some(&hints))
}

/// Encrypt `plaintext`, marking it as a binary file when `hints` are given.
pub fn encrypt_with_hints<R: Read>(
    plaintext: R,
    key: &str,
    hints: Option<&FileHints>,
) -> Result<String, CryptoError> {
    if key.is_empty() {
        return Err(CryptoError::EmptyKey);
    }
    encrypt_with_randomness(plaintext, key, hints, &EnvelopeRandomness::generate()?)
}

/// Encrypt with caller-supplied random material.
///
/// Identical inputs produce identical output, which makes this the entry
/// point for reproducible tests. Never reuse `randomness` across messages.
pub fn encrypt_with_randomness<R: Read>(
    mut plaintext: R,
    key: &str,
    hints: Option<&FileHints>,
    randomness: &EnvelopeRandomness,
) -> Result<String, CryptoError> {
    if key.is_empty() {
        return Err(CryptoError::EmptyKey);
    }

    let mut armor = ArmorWriter::new(Vec::new(), &[("Comment", ARMOR_COMMENT)])?;
    armor.write_all(&session_key_packet(key, randomness)?)?;

    let mut seipd = PartialBodyWriter::new(armor, TAG_SEIPD);
    seipd.write_all(&[SEIPD_VERSION])?;

    let mut protected = ProtectedWriter::new(seipd, randomness.session_key.as_slice())?;
    let mut prefix = [0u8; 18];
    prefix[..16].copy_from_slice(&randomness.prefix);
    prefix[16..].copy_from_slice(&randomness.prefix[14..]);
    protected.write_all(&prefix)?;

    let mut literal = PartialBodyWriter::new(protected, TAG_LITERAL);
    literal.write_all(&literal_header(hints))?;
    io::copy(&mut plaintext, &mut literal)?;

    let protected = literal.finish()?;
    let seipd = protected.finish()?;
    let armor = seipd.finish()?;
    let armored = armor.finish()?;

    String::from_utf8(armored).map_err(|err| CryptoError::Io(err.to_string()))
}

/// SKESK v4 carrying the session key encrypted under the S2K-derived key.
fn session_key_packet(key: &str, randomness: &EnvelopeRandomness) -> Result<Vec<u8>, CryptoError> {
    let s2k = StringToKey::iterated(randomness.salt);
    let key_encryption_key = s2k.derive_key(key.as_bytes(), CIPHER.key_size());

    let mut encrypted_session_key = Vec::with_capacity(1 + randomness.session_key.len());
    encrypted_session_key.push(CIPHER.id());
    encrypted_session_key.extend_from_slice(randomness.session_key.as_slice());
    CfbEncryptor::new(CIPHER, &key_encryption_key)?.apply(&mut encrypted_session_key);

    let mut body = vec![SKESK_VERSION, CIPHER.id()];
    s2k.write(&mut body);
    body.extend_from_slice(&encrypted_session_key);
    Ok(packet::encode_packet(TAG_SKESK, &body))
}

/// Literal data header: format, file name and date.
fn literal_header(hints: Option<&FileHints>) -> Vec<u8> {
    match hints {
        Some(hints) => {
            let name = hints.filename.as_bytes();
            let name = &name[..name.len().min(255)];
            let mut header = Vec::with_capacity(6 + name.len());
            header.push(b'b');
            header.push(name.len() as u8);
            header.extend_from_slice(name);
            header.extend_from_slice(&hints.modified.to_be_bytes());
            header
        },
        None => vec![b'u', 0, 0, 0, 0, 0],
    }
}

/// Encrypts everything written to it and keeps the running MDC hash.
struct ProtectedWriter<W: Write> {
    inner: W,
    cipher: CfbEncryptor,
    mdc: Sha1,
}

impl<W: Write> ProtectedWriter<W> {
    fn new(inner: W, session_key: &[u8]) -> Result<Self, CryptoError> {
        Ok(Self { inner, cipher: CfbEncryptor::new(CIPHER, session_key)?, mdc: Sha1::new() })
    }

    /// Append the MDC packet and return the inner writer.
    fn finish(mut self) -> io::Result<W> {
        self.write_all(&MDC_HEADER)?;
        let mut digest = self.mdc.finalize().to_vec();
        self.cipher.apply(&mut digest);
        self.inner.write_all(&digest)?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for ProtectedWriter<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.mdc.update(data);
        let mut encrypted = data.to_vec();
        self.cipher.apply(&mut encrypted);
        self.inner.write_all(&encrypted)?;
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use zeroize::Zeroizing;

    use super::*;
    use crate::openpgp::{armor, packet::parse_packets};

    fn fixed_randomness() -> EnvelopeRandomness {
        EnvelopeRandomness {
            salt: [1; 8],
            session_key: Zeroizing::new([2; 32]),
            prefix: [3; 16],
        }
    }

    #[test]
    fn empty_key_is_rejected_before_reading() {
        struct Exploding;
        impl Read for Exploding {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("must not be read"))
            }
        }

        assert_eq!(encrypt(Exploding, ""), Err(CryptoError::EmptyKey));
    }

    #[test]
    fn read_failure_propagates() {
        struct Failing;
        impl Read for Failing {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("disk gone"))
            }
        }

        assert_eq!(encrypt(Failing, "key"), Err(CryptoError::Io("disk gone".to_string())));
    }

    #[test]
    fn output_is_armored_with_comment() {
        let armored = encrypt(&b"hello"[..], "key").unwrap();
        assert!(armored.starts_with("-----BEGIN PGP MESSAGE-----\n"));
        assert!(armored.contains(&format!("Comment: {ARMOR_COMMENT}\n")));
        assert!(armored.ends_with("-----END PGP MESSAGE-----\n"));
    }

    #[test]
    fn packet_profile() {
        let armored =
            encrypt_with_randomness(&b"hello"[..], "key", None, &fixed_randomness()).unwrap();
        let packets = parse_packets(&armor::decode(&armored).unwrap()).unwrap();

        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].tag, TAG_SKESK);
        // version, AES-256, iterated S2K, SHA-256
        assert_eq!(&packets[0].body[..4], &[4, 9, 3, 8]);
        // S2K salt, count, then 33 bytes of encrypted session key
        assert_eq!(packets[0].body.len(), 4 + 8 + 1 + 33);
        assert_eq!(packets[1].tag, TAG_SEIPD);
        assert_eq!(packets[1].body[0], SEIPD_VERSION);
    }

    #[test]
    fn fixed_randomness_is_deterministic() {
        let first =
            encrypt_with_randomness(&b"same"[..], "key", None, &fixed_randomness()).unwrap();
        let second =
            encrypt_with_randomness(&b"same"[..], "key", None, &fixed_randomness()).unwrap();
        assert_eq!(first, second);

        let fresh = encrypt(&b"same"[..], "key").unwrap();
        assert_ne!(first, fresh);
    }

    #[test]
    fn literal_header_formats() {
        assert_eq!(literal_header(None), vec![b'u', 0, 0, 0, 0, 0]);

        let hints = FileHints { filename: "a.txt".to_string(), modified: 0x0102_0304 };
        assert_eq!(literal_header(Some(&hints)), b"b\x05a.txt\x01\x02\x03\x04".to_vec());
    }
}
