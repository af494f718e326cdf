//! Server-wide validation policy.

use vanish_proto::{Expiration, Secret};

use crate::error::{ConfigurationError, ValidationError};

/// Default maximum length of an encrypted message in bytes
pub const DEFAULT_MAX_LENGTH: usize = 10_000;

/// Immutable validation settings passed to the service at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    /// Reject secrets that are not one-time
    pub force_one_time: bool,
    /// Longest accepted expiration in seconds; must itself be a valid
    /// expiration
    pub max_expiration: Option<i32>,
    /// Longest accepted `message` in bytes
    pub max_length: usize,
}

impl Default for Policy {
    fn default() -> Self {
        Self { force_one_time: false, max_expiration: None, max_length: DEFAULT_MAX_LENGTH }
    }
}

impl Policy {
    /// Check the policy itself.
    ///
    /// Run at startup so a bad override stops the server instead of failing
    /// every request.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.max_expiration().map(|_| ())
    }

    /// The configured maximum, if any, as a typed expiration.
    pub fn max_expiration(&self) -> Result<Option<Expiration>, ConfigurationError> {
        self.max_expiration
            .map(|secs| {
                Expiration::try_from(secs).map_err(|_| ConfigurationError::InvalidMaxExpiration(secs))
            })
            .transpose()
    }

    /// Validate a secret against this policy, in the order the rules are
    /// documented: expiration, one-time, maximum expiration, length.
    pub(crate) fn check(&self, secret: &Secret) -> Result<(), PolicyViolation> {
        let expiration =
            secret.expiration().map_err(|_| ValidationError::InvalidExpiration)?;

        if self.force_one_time && !secret.one_time {
            return Err(ValidationError::MustBeOneTime.into());
        }

        if let Some(max) = self.max_expiration()? {
            if expiration > max {
                return Err(ValidationError::ExpirationExceedsMaximum.into());
            }
        }

        if secret.message.len() > self.max_length {
            return Err(ValidationError::MessageTooLong.into());
        }

        Ok(())
    }
}

/// Outcome of [`Policy::check`]: the request or the policy is at fault.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum PolicyViolation {
    Request(ValidationError),
    Configuration(ConfigurationError),
}

impl From<ValidationError> for PolicyViolation {
    fn from(err: ValidationError) -> Self {
        Self::Request(err)
    }
}

impl From<ConfigurationError> for PolicyViolation {
    fn from(err: ConfigurationError) -> Self {
        Self::Configuration(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(expiration: i32, one_time: bool, len: usize) -> Secret {
        Secret { expiration, message: "x".repeat(len), one_time }
    }

    #[test]
    fn default_policy() {
        let policy = Policy::default();
        assert_eq!(policy.max_length, 10_000);
        assert!(policy.validate().is_ok());
        assert_eq!(policy.check(&secret(3600, false, 10_000)), Ok(()));
        assert_eq!(
            policy.check(&secret(3600, false, 10_001)),
            Err(PolicyViolation::Request(ValidationError::MessageTooLong))
        );
    }

    #[test]
    fn invalid_override_is_configuration_error() {
        let policy = Policy { max_expiration: Some(7200), ..Policy::default() };
        assert_eq!(policy.validate(), Err(ConfigurationError::InvalidMaxExpiration(7200)));
        assert_eq!(
            policy.check(&secret(3600, false, 1)),
            Err(PolicyViolation::Configuration(ConfigurationError::InvalidMaxExpiration(7200)))
        );
    }

    #[test]
    fn rules_apply_in_order() {
        let policy = Policy {
            force_one_time: true,
            max_expiration: Some(3600),
            max_length: 4,
        };

        // Bad expiration wins over every other problem.
        assert_eq!(
            policy.check(&secret(1, false, 100)),
            Err(PolicyViolation::Request(ValidationError::InvalidExpiration))
        );
        assert_eq!(
            policy.check(&secret(86_400, false, 100)),
            Err(PolicyViolation::Request(ValidationError::MustBeOneTime))
        );
        assert_eq!(
            policy.check(&secret(86_400, true, 100)),
            Err(PolicyViolation::Request(ValidationError::ExpirationExceedsMaximum))
        );
        assert_eq!(
            policy.check(&secret(3600, true, 100)),
            Err(PolicyViolation::Request(ValidationError::MessageTooLong))
        );
        assert_eq!(policy.check(&secret(3600, true, 4)), Ok(()));
    }
}
