//! Encrypt-and-upload and fetch-and-decrypt flows.
//!
//! Encryption and decryption run on the blocking pool; only ciphertext ever
//! leaves the process.

use std::path::PathBuf;

use vanish_crypto::{Decrypted, decrypt, encrypt, encrypt_file, generate_key};
use vanish_proto::{Expiration, Secret, SecretId, parse_url, secret_url};

use crate::{Client, ClientError, client::Payload};

/// How a new secret is shared.
#[derive(Debug, Clone)]
pub struct ShareOptions {
    /// Lifetime on the server
    pub expiration: Expiration,
    /// Delete after the first read
    pub one_time: bool,
    /// Caller-chosen key, kept out of the link; random when `None`
    pub key: Option<String>,
    /// Base of the share link (the web client)
    pub link_base: String,
}

/// A stored secret and the link pointing at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shared {
    /// Server id
    pub id: SecretId,
    /// Decryption key
    pub key: String,
    /// Link to hand to the recipient
    pub link: String,
}

/// What to encrypt.
#[derive(Debug, Clone)]
pub enum Plaintext {
    /// Raw bytes, shared as text
    Bytes(Vec<u8>),
    /// File on disk, shared with its name
    File(PathBuf),
}

/// Encrypt `plaintext`, upload it and build the share link.
pub async fn share(
    client: &Client,
    plaintext: Plaintext,
    options: &ShareOptions,
) -> Result<Shared, ClientError> {
    let manual_key = options.key.is_some();
    let key = match &options.key {
        Some(key) => key.clone(),
        None => generate_key()?,
    };

    let payload = match plaintext {
        Plaintext::Bytes(_) => Payload::Text,
        Plaintext::File(_) => Payload::File,
    };
    let envelope_key = key.clone();
    let armored = tokio::task::spawn_blocking(move || match plaintext {
        Plaintext::Bytes(bytes) => encrypt(bytes.as_slice(), &envelope_key),
        Plaintext::File(path) => encrypt_file(&path, &envelope_key),
    })
    .await
    .map_err(|e| ClientError::Internal(e.to_string()))??;

    let secret = Secret::new(armored, options.expiration, options.one_time);
    let id = client.store_as(payload, &secret).await?;
    let link = secret_url(
        &options.link_base,
        &id.to_string(),
        &key,
        payload == Payload::File,
        manual_key,
    );

    Ok(Shared { id, key, link })
}

/// Fetch and decrypt the secret behind a share link.
///
/// `key` is required when the link does not embed one and ignored
/// otherwise. One-time secrets are consumed even if decryption then fails.
pub async fn open(client: &Client, link: &str, key: Option<&str>) -> Result<Decrypted, ClientError> {
    let reference = parse_url(link)?;
    let key = if reference.key.is_empty() {
        key.filter(|k| !k.is_empty()).ok_or(ClientError::MissingKey)?.to_string()
    } else {
        reference.key
    };
    let id = SecretId::parse(&reference.id)?;
    let payload = if reference.file { Payload::File } else { Payload::Text };

    let secret = client.fetch_as(payload, &id).await?;

    let decrypted = tokio::task::spawn_blocking(move || decrypt(secret.message.as_bytes(), &key))
        .await
        .map_err(|e| ClientError::Internal(e.to_string()))??;

    Ok(decrypted)
}
