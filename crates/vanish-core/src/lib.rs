//! Secret lifecycle core for vanish
//!
//! Validation, id generation and the one-time/expiring lifecycle, on top of
//! an abstract [`SecretStore`]. No I/O happens here beyond the store calls;
//! time and randomness come from an [`Environment`].
//!
//! # Components
//!
//! - [`SecretService`]: create, retrieve, delete and status operations
//! - [`Policy`]: immutable validation settings
//! - [`SecretStore`]: storage contract, with [`MemoryStore`] and the
//!   fault-injecting [`ChaoticStore`]
//! - [`Environment`]: time and randomness

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
pub mod error;
pub mod policy;
pub mod service;
pub mod store;

pub use env::Environment;
pub use error::{ConfigurationError, ServiceError, ValidationError};
pub use policy::{DEFAULT_MAX_LENGTH, Policy};
pub use service::SecretService;
pub use store::{ChaoticStore, MemoryStore, SecretStore, StoreError};
