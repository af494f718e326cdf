//! Envelope decryption

use std::io::Read;

use flate2::read::{DeflateDecoder, ZlibDecoder};
use sha1::{Digest, Sha1};
use zeroize::Zeroizing;

use super::{Decrypted, OneShotKey};
use crate::{
    CryptoError,
    openpgp::{
        BLOCK_SIZE, CfbDecryptor, StringToKey, SymmetricAlgorithm, armor,
        packet::{
            self, ByteReader, Packet, TAG_COMPRESSED, TAG_LITERAL, TAG_MARKER, TAG_MDC, TAG_SED,
            TAG_SEIPD, TAG_SKESK,
        },
    },
};

/// Public-key encrypted session key
const TAG_PKESK: u8 = 1;

/// Prefix length: one block plus the two repeated quick-check bytes
const PREFIX_LEN: usize = BLOCK_SIZE + 2;

/// MDC packet length: two header bytes and a SHA-1 digest
const MDC_LEN: usize = 22;

/// Compression algorithm ids (RFC 4880 section 9.3)
const COMPRESSION_NONE: u8 = 0;
const COMPRESSION_ZIP: u8 = 1;
const COMPRESSION_ZLIB: u8 = 2;

/// Decrypt an armored envelope with `key`.
///
/// Exactly one key attempt is made. When the message carries several
/// session key packets, the second one asks for the key again and gets
/// [`CryptoError::InvalidKey`], ending the call instead of retrying.
///
/// # Errors
///
/// - [`CryptoError::InvalidMessage`] if `ciphertext` is not armored
/// - [`CryptoError::InvalidKey`] if `key` does not unlock the message
/// - [`CryptoError::IntegrityCheckFailed`] if the payload was modified
/// - [`CryptoError::MalformedPacket`] / [`CryptoError::Unsupported`] for
///   structural problems
pub fn decrypt<R: Read>(mut ciphertext: R, key: &str) -> Result<Decrypted, CryptoError> {
    let mut text = String::new();
    ciphertext.read_to_string(&mut text).map_err(|_| CryptoError::InvalidMessage)?;
    let binary = armor::decode(&text)?;

    let mut session_key_packets = Vec::new();
    let mut encrypted = None;
    for packet in packet::parse_packets(&binary)? {
        match packet.tag {
            TAG_SKESK => session_key_packets.push(packet.body),
            TAG_SEIPD => {
                encrypted = Some(packet.body);
                break;
            },
            TAG_SED => {
                return Err(CryptoError::Unsupported(
                    "encrypted data without integrity protection".to_string(),
                ));
            },
            TAG_MARKER => {},
            TAG_PKESK => {
                return Err(CryptoError::Unsupported(
                    "public-key encrypted session key".to_string(),
                ));
            },
            other => return Err(CryptoError::MalformedPacket(format!("unexpected packet tag {other}"))),
        }
    }
    let encrypted = encrypted
        .ok_or_else(|| CryptoError::MalformedPacket("no encrypted data packet".to_string()))?;
    if session_key_packets.is_empty() {
        return Err(CryptoError::MalformedPacket("no session key packet".to_string()));
    }

    let mut provider = OneShotKey::new(key.as_bytes());
    for body in &session_key_packets {
        let passphrase = provider.provide()?;
        let Some((algorithm, session_key)) = unlock_session_key(body, passphrase)? else {
            continue;
        };
        if let Some(decrypted) = open_protected(&encrypted, algorithm, &session_key)? {
            return Ok(decrypted);
        }
    }

    Err(CryptoError::InvalidKey)
}

/// Recover the session key from one SKESK packet.
///
/// `Ok(None)` means the passphrase did not produce a plausible session key.
fn unlock_session_key(
    body: &[u8],
    passphrase: &[u8],
) -> Result<Option<(SymmetricAlgorithm, Zeroizing<Vec<u8>>)>, CryptoError> {
    let mut reader = ByteReader::new(body);
    let version = reader.u8()?;
    if version != 4 {
        return Err(CryptoError::Unsupported(format!("SKESK version {version}")));
    }
    let algorithm = cipher_from_id(reader.u8()?)?;
    let s2k = StringToKey::parse(&mut reader)?;
    let derived = s2k.derive_key(passphrase, algorithm.key_size());

    let encrypted_key = reader.rest();
    if encrypted_key.is_empty() {
        return Ok(Some((algorithm, derived)));
    }

    let mut plain = Zeroizing::new(encrypted_key.to_vec());
    CfbDecryptor::new(algorithm, &derived)?.apply(&mut plain);

    let Some(session_algorithm) = SymmetricAlgorithm::from_id(plain[0]) else {
        return Ok(None);
    };
    if plain.len() - 1 != session_algorithm.key_size() {
        return Ok(None);
    }
    Ok(Some((session_algorithm, Zeroizing::new(plain[1..].to_vec()))))
}

/// Decrypt a SEIPD body and unwrap the literal data inside.
///
/// `Ok(None)` means the quick check rejected the session key.
fn open_protected(
    body: &[u8],
    algorithm: SymmetricAlgorithm,
    session_key: &[u8],
) -> Result<Option<Decrypted>, CryptoError> {
    let (&version, ciphertext) = body
        .split_first()
        .ok_or_else(|| CryptoError::MalformedPacket("empty encrypted data packet".to_string()))?;
    if version != 1 {
        return Err(CryptoError::Unsupported(format!("SEIPD version {version}")));
    }
    if ciphertext.len() < PREFIX_LEN + MDC_LEN {
        return Err(CryptoError::MalformedPacket("encrypted data too short".to_string()));
    }

    let mut plain = ciphertext.to_vec();
    CfbDecryptor::new(algorithm, session_key)?.apply(&mut plain);

    if plain[BLOCK_SIZE - 2..BLOCK_SIZE] != plain[BLOCK_SIZE..PREFIX_LEN] {
        return Ok(None);
    }

    let (hashed, digest) = plain.split_at(plain.len() - 20);
    let mdc_header = &hashed[hashed.len() - 2..];
    if mdc_header != [0xC0 | TAG_MDC, 20] || Sha1::digest(hashed).as_slice() != digest {
        return Err(CryptoError::IntegrityCheckFailed);
    }

    let inner = &plain[PREFIX_LEN..plain.len() - MDC_LEN];
    read_literal(packet::parse_packets(inner)?).map(Some)
}

/// Find the literal packet, looking through compression layers.
fn read_literal(packets: Vec<Packet>) -> Result<Decrypted, CryptoError> {
    for packet in packets {
        match packet.tag {
            TAG_LITERAL => return parse_literal(&packet.body),
            TAG_COMPRESSED => {
                let (&algorithm, data) = packet.body.split_first().ok_or_else(|| {
                    CryptoError::MalformedPacket("empty compressed packet".to_string())
                })?;
                let inflated = decompress(algorithm, data)?;
                return read_literal(packet::parse_packets(&inflated)?);
            },
            TAG_MARKER => {},
            other => {
                return Err(CryptoError::MalformedPacket(format!(
                    "unexpected packet tag {other} inside encrypted data"
                )));
            },
        }
    }
    Err(CryptoError::MalformedPacket("no literal data".to_string()))
}

fn decompress(algorithm: u8, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut out = Vec::new();
    let inflated = match algorithm {
        COMPRESSION_NONE => return Ok(data.to_vec()),
        COMPRESSION_ZIP => DeflateDecoder::new(data).read_to_end(&mut out),
        COMPRESSION_ZLIB => ZlibDecoder::new(data).read_to_end(&mut out),
        other => {
            return Err(CryptoError::Unsupported(format!("compression algorithm {other}")));
        },
    };
    inflated.map_err(|e| CryptoError::MalformedPacket(format!("corrupt compressed data: {e}")))?;
    Ok(out)
}

fn parse_literal(body: &[u8]) -> Result<Decrypted, CryptoError> {
    let mut reader = ByteReader::new(body);
    let format = reader.u8()?;
    let name_len = usize::from(reader.u8()?);
    let name = reader.take(name_len)?;
    reader.take(4)?;

    let filename = (format == b'b').then(|| String::from_utf8_lossy(name).into_owned());
    Ok(Decrypted { content: reader.rest().to_vec(), filename })
}

fn cipher_from_id(id: u8) -> Result<SymmetricAlgorithm, CryptoError> {
    SymmetricAlgorithm::from_id(id)
        .ok_or_else(|| CryptoError::Unsupported(format!("symmetric algorithm {id}")))
}
