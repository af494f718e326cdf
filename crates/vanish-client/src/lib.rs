//! Client for vanish servers.
//!
//! [`Client`] speaks the HTTP API. [`share`] and [`open`] add the envelope
//! on top: plaintext is encrypted locally, only ciphertext is uploaded, and
//! the key travels in the link fragment (or out of band for manual keys).
//!
//! # Components
//!
//! - [`Client`]: store, fetch, status, delete and config calls
//! - [`share`]: encrypt, upload and build a share link
//! - [`open`]: parse a link, fetch and decrypt
//! - [`ClientError`]: transport, server, envelope and link failures

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod error;
mod share;

pub use client::{Client, Payload};
pub use error::ClientError;
pub use share::{Plaintext, ShareOptions, Shared, open, share};
