//! Secret identifiers.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::{Builder, Uuid};

use crate::ProtoError;

/// Identifier of a stored secret: a random UUID v4.
///
/// The canonical text form is lower-case and hyphenated, matching
/// `[0-9a-f]{8}-([0-9a-f]{4}-){3}[0-9a-f]{12}`. Parsing accepts only that
/// form, so upper-case, braced or simple UUIDs are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SecretId(Uuid);

impl SecretId {
    /// Length of the canonical text form
    pub const TEXT_LEN: usize = 36;

    /// Build a v4 id from 16 random bytes.
    ///
    /// The version and variant bits are overwritten, leaving 122 random bits.
    pub fn from_random_bytes(bytes: [u8; 16]) -> Self {
        Self(Builder::from_random_bytes(bytes).into_uuid())
    }

    /// Parse the canonical text form.
    pub fn parse(text: &str) -> Result<Self, ProtoError> {
        if !is_canonical(text) {
            return Err(ProtoError::InvalidSecretId(text.to_string()));
        }
        Uuid::parse_str(text).map(Self).map_err(|_| ProtoError::InvalidSecretId(text.to_string()))
    }

    /// Underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

/// True if `text` has the shape `8-4-4-4-12` of lower-case hex digits.
pub fn is_canonical(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == SecretId::TEXT_LEN
        && bytes.iter().enumerate().all(|(i, b)| match i {
            8 | 13 | 18 | 23 => *b == b'-',
            _ => b.is_ascii_digit() || (b'a'..=b'f').contains(b),
        })
}

impl fmt::Display for SecretId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for SecretId {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for SecretId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SecretId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
