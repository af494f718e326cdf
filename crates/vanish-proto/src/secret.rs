//! The stored secret and its expiration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ProtoError;

/// Accepted lifetimes of a stored secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Expiration {
    /// 3600 seconds
    OneHour,
    /// 86400 seconds
    OneDay,
    /// 604800 seconds
    OneWeek,
}

impl Expiration {
    /// All accepted values, shortest first.
    pub const ALL: [Self; 3] = [Self::OneHour, Self::OneDay, Self::OneWeek];

    /// Lifetime in seconds as carried on the wire.
    pub fn as_secs(self) -> i32 {
        match self {
            Self::OneHour => 3600,
            Self::OneDay => 86_400,
            Self::OneWeek => 604_800,
        }
    }

    /// Lifetime as a [`Duration`].
    pub fn duration(self) -> Duration {
        Duration::from_secs(u64::from(self.as_secs().unsigned_abs()))
    }
}

impl TryFrom<i32> for Expiration {
    type Error = ProtoError;

    fn try_from(secs: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|expiration| expiration.as_secs() == secs)
            .ok_or(ProtoError::InvalidExpiration(secs))
    }
}

impl From<Expiration> for i32 {
    fn from(expiration: Expiration) -> Self {
        expiration.as_secs()
    }
}

/// An encrypted message with its retention policy.
///
/// `message` is opaque armored ciphertext. `expiration` stays a raw integer
/// so that out-of-range values survive deserialization and can be rejected
/// with a proper validation message.
///
/// Serializes as `{"expiration":…,"message":…,"one_time":…}`, omitting a zero
/// expiration and a false `one_time`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Secret {
    /// Lifetime in seconds
    #[serde(default, skip_serializing_if = "is_zero")]
    pub expiration: i32,
    /// Armored ciphertext
    pub message: String,
    /// Delete after the first successful read
    #[serde(default, skip_serializing_if = "is_false")]
    pub one_time: bool,
}

impl Secret {
    /// Build a secret with a validated expiration.
    pub fn new(message: impl Into<String>, expiration: Expiration, one_time: bool) -> Self {
        Self { expiration: expiration.as_secs(), message: message.into(), one_time }
    }

    /// Typed view of the expiration, if it is one of the accepted values.
    pub fn expiration(&self) -> Result<Expiration, ProtoError> {
        Expiration::try_from(self.expiration)
    }

    /// Encode as the JSON stored by backends and returned over HTTP.
    pub fn to_json(&self) -> Result<Vec<u8>, ProtoError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode the JSON produced by [`to_json`](Self::to_json).
    pub fn from_json(bytes: &[u8]) -> Result<Self, ProtoError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(value: &i32) -> bool {
    *value == 0
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_three_expirations_accepted() {
        assert_eq!(Expiration::try_from(3600), Ok(Expiration::OneHour));
        assert_eq!(Expiration::try_from(86_400), Ok(Expiration::OneDay));
        assert_eq!(Expiration::try_from(604_800), Ok(Expiration::OneWeek));

        for bad in [0, -1, 1, 3599, 3601, 7200, 604_801, i32::MAX, i32::MIN] {
            assert_eq!(Expiration::try_from(bad), Err(ProtoError::InvalidExpiration(bad)));
        }
    }

    #[test]
    fn json_field_order_and_omission() {
        let full = Secret { expiration: 3600, message: "m".to_string(), one_time: true };
        assert_eq!(
            String::from_utf8(full.to_json().unwrap()).unwrap(),
            r#"{"expiration":3600,"message":"m","one_time":true}"#
        );

        let bare = Secret { expiration: 0, message: "m".to_string(), one_time: false };
        assert_eq!(String::from_utf8(bare.to_json().unwrap()).unwrap(), r#"{"message":"m"}"#);
    }

    #[test]
    fn missing_fields_default() {
        let secret = Secret::from_json(br#"{"message":"x"}"#).unwrap();
        assert_eq!(secret, Secret { expiration: 0, message: "x".to_string(), one_time: false });
    }

    #[test]
    fn malformed_json_is_serialization_error() {
        assert!(matches!(Secret::from_json(b"{"), Err(ProtoError::Serialization(_))));
    }

    #[test]
    fn duration_matches_seconds() {
        assert_eq!(Expiration::OneDay.duration(), Duration::from_secs(86_400));
    }
}
