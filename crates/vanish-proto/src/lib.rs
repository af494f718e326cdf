//! Data model and wire formats for vanish
//!
//! Types shared by the server, the client and the store adapters: the stored
//! [`Secret`], its [`Expiration`], [`SecretId`]s, share links and HTTP bodies.
//!
//! # Components
//!
//! - [`Secret`]: ciphertext plus retention policy, with its JSON encoding
//! - [`SecretId`]: UUID v4 identifier with strict text parsing
//! - [`link`]: building and parsing `<base>/#/<tag>/<id>[/<key>]` links
//! - [`api`]: response bodies of the HTTP API

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod api;
mod error;
mod id;
pub mod link;
mod secret;

pub use error::ProtoError;
pub use id::{SecretId, is_canonical};
pub use link::{LinkKind, ShareReference, parse_url, secret_url};
pub use secret::{Expiration, Secret};
