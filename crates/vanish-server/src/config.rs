//! Command-line and environment configuration.
//!
//! Every flag can also be set through a `VANISH_*` environment variable.
//! Flags win over the environment.

use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use clap::{Parser, ValueEnum};
use vanish_core::{DEFAULT_MAX_LENGTH, Policy};

use crate::ServerError;

/// Which storage backend holds secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Process memory; everything is lost on restart
    Memory,
    /// Redb database file
    Redb,
}

/// Vanish secret sharing server
#[derive(Parser, Debug, Clone)]
#[command(name = "vanish-server")]
#[command(about = "One-time secret sharing server")]
#[command(version)]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "VANISH_ADDRESS", default_value = "0.0.0.0")]
    pub address: IpAddr,

    /// Port to listen on
    #[arg(long, env = "VANISH_PORT", default_value_t = 1337)]
    pub port: u16,

    /// Storage backend
    #[arg(long, env = "VANISH_DATABASE", value_enum, default_value_t = Backend::Redb)]
    pub database: Backend,

    /// Path of the redb database file
    #[arg(long, env = "VANISH_DB_PATH", default_value = "vanish.redb")]
    pub db_path: PathBuf,

    /// Maximum length of an encrypted message in bytes
    #[arg(long, env = "VANISH_MAX_LENGTH", default_value_t = DEFAULT_MAX_LENGTH)]
    pub max_length: usize,

    /// Reject secrets that are not one-time downloads
    #[arg(long, env = "VANISH_FORCE_ONETIME_SECRETS")]
    pub force_onetime_secrets: bool,

    /// Longest accepted expiration in seconds (3600, 86400 or 604800)
    #[arg(long, env = "VANISH_FORCE_EXPIRATION")]
    pub force_expiration: Option<i32>,

    /// Disable the file upload endpoints
    #[arg(long, env = "VANISH_DISABLE_UPLOAD")]
    pub disable_upload: bool,

    /// Value of the Access-Control-Allow-Origin header
    #[arg(long, env = "VANISH_CORS_ALLOW_ORIGIN", default_value = "*")]
    pub cors_allow_origin: String,

    /// Send Strict-Transport-Security (only behind TLS)
    #[arg(long, env = "VANISH_HSTS")]
    pub hsts: bool,

    /// Seconds between expiry sweeps
    #[arg(long, env = "VANISH_SWEEP_INTERVAL", default_value_t = 60)]
    pub sweep_interval: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "VANISH_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// HTTP surface settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Access-Control-Allow-Origin value
    pub cors_allow_origin: String,
    /// Serve `/file` routes or not
    pub disable_upload: bool,
    /// Add Strict-Transport-Security to responses
    pub hsts: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { cors_allow_origin: "*".to_string(), disable_upload: false, hsts: false }
    }
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address
    pub listen_addr: SocketAddr,
    /// Storage backend
    pub database: Backend,
    /// Redb file, used when `database` is [`Backend::Redb`]
    pub db_path: PathBuf,
    /// Validation policy handed to the service
    pub policy: Policy,
    /// HTTP surface settings
    pub http: HttpConfig,
    /// Time between expiry sweeps
    pub sweep_interval: Duration,
}

impl TryFrom<Args> for ServerConfig {
    type Error = ServerError;

    fn try_from(args: Args) -> Result<Self, ServerError> {
        if args.max_length == 0 {
            return Err(ServerError::Config("max length must be positive".into()));
        }
        if args.sweep_interval == 0 {
            return Err(ServerError::Config("sweep interval must be positive".into()));
        }

        let policy = Policy {
            force_one_time: args.force_onetime_secrets,
            max_expiration: args.force_expiration,
            max_length: args.max_length,
        };
        policy.validate()?;

        Ok(Self {
            listen_addr: SocketAddr::new(args.address, args.port),
            database: args.database,
            db_path: args.db_path,
            policy,
            http: HttpConfig {
                cors_allow_origin: args.cors_allow_origin,
                disable_upload: args.disable_upload,
                hsts: args.hsts,
            },
            sweep_interval: Duration::from_secs(args.sweep_interval),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("vanish-server").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let config = ServerConfig::try_from(parse(&[])).unwrap();

        assert_eq!(config.listen_addr.port(), 1337);
        assert_eq!(config.database, Backend::Redb);
        assert_eq!(config.policy, Policy::default());
        assert_eq!(config.http, HttpConfig::default());
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
    }

    #[test]
    fn policy_flags() {
        let config = ServerConfig::try_from(parse(&[
            "--force-onetime-secrets",
            "--force-expiration",
            "86400",
            "--max-length",
            "500",
            "--database",
            "memory",
        ]))
        .unwrap();

        assert!(config.policy.force_one_time);
        assert_eq!(config.policy.max_expiration, Some(86_400));
        assert_eq!(config.policy.max_length, 500);
        assert_eq!(config.database, Backend::Memory);
    }

    #[test]
    fn invalid_max_expiration_fails_startup() {
        let err = ServerConfig::try_from(parse(&["--force-expiration", "100"])).unwrap_err();

        assert!(matches!(err, ServerError::Policy(_)));
        assert!(err.is_config_error());
    }

    #[test]
    fn zero_max_length_rejected() {
        let err = ServerConfig::try_from(parse(&["--max-length", "0"])).unwrap_err();

        assert!(matches!(err, ServerError::Config(_)));
    }
}
