//! Client against a real server
//!
//! Starts the HTTP API on an ephemeral port with an in-memory store and
//! drives it through `Client`, `share` and `open`:
//!
//! 1. **Round-trip**: shared text and files decrypt to the original bytes
//! 2. **One-time**: a one-time link opens exactly once
//! 3. **Manual keys**: the key stays out of the link and must be supplied
//! 4. **Errors**: server rejections surface as `ClientError::Server`

use std::io::Write as _;

use tempfile::NamedTempFile;
use tokio::net::TcpListener;
use vanish_client::{Client, ClientError, Plaintext, ShareOptions, open, share};
use vanish_core::{MemoryStore, Policy, SecretService};
use vanish_crypto::{CryptoError, KEY_LENGTH};
use vanish_harness::SimEnv;
use vanish_proto::{Expiration, LinkKind, Secret, parse_url};
use vanish_server::{HttpConfig, http};

async fn spawn_server(policy: Policy) -> String {
    let env = SimEnv::with_seed(0xE2E);
    let service = SecretService::new(MemoryStore::new(env.clone()), env, policy);
    let router = http::router(service, HttpConfig::default()).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{addr}")
}

fn options(api: &str, one_time: bool, key: Option<&str>) -> ShareOptions {
    ShareOptions {
        expiration: Expiration::OneHour,
        one_time,
        key: key.map(str::to_string),
        link_base: format!("{api}/web"),
    }
}

#[tokio::test]
async fn text_roundtrip_is_one_time() {
    let api = spawn_server(Policy::default()).await;
    let client = Client::new(&api).unwrap();

    let shared =
        share(&client, Plaintext::Bytes(b"hunter2".to_vec()), &options(&api, true, None))
            .await
            .unwrap();

    assert_eq!(shared.key.len(), KEY_LENGTH);
    assert!(shared.link.starts_with(&format!("{api}/web/#/s/{}/", shared.id)));
    assert!(client.status(&shared.id).await.unwrap());

    let decrypted = open(&client, &shared.link, None).await.unwrap();
    assert_eq!(decrypted.content, b"hunter2");
    assert_eq!(decrypted.filename, None);

    let err = open(&client, &shared.link, None).await.unwrap_err();
    assert!(err.is_not_found(), "{err}");
}

#[tokio::test]
async fn file_roundtrip_keeps_name() {
    let api = spawn_server(Policy::default()).await;
    let client = Client::new(&api).unwrap();

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&[0, 1, 2, 254, 255]).unwrap();
    let expected_name = file.path().file_name().unwrap().to_string_lossy().to_string();

    let shared = share(
        &client,
        Plaintext::File(file.path().to_path_buf()),
        &options(&api, false, None),
    )
    .await
    .unwrap();
    assert_eq!(parse_url(&shared.link).unwrap().kind(), LinkKind::File);

    for _ in 0..2 {
        let decrypted = open(&client, &shared.link, None).await.unwrap();
        assert_eq!(decrypted.content, [0, 1, 2, 254, 255]);
        assert_eq!(decrypted.filename.as_deref(), Some(expected_name.as_str()));
    }
}

#[tokio::test]
async fn manual_key_must_be_supplied() {
    let api = spawn_server(Policy::default()).await;
    let client = Client::new(&api).unwrap();

    let shared = share(
        &client,
        Plaintext::Bytes(b"launch codes".to_vec()),
        &options(&api, false, Some("correct horse")),
    )
    .await
    .unwrap();

    assert_eq!(shared.link, format!("{api}/web/#/c/{}", shared.id));
    assert!(matches!(open(&client, &shared.link, None).await, Err(ClientError::MissingKey)));

    let err = open(&client, &shared.link, Some("wrong horse")).await.unwrap_err();
    assert!(matches!(err, ClientError::Crypto(CryptoError::InvalidKey)));

    let decrypted = open(&client, &shared.link, Some("correct horse")).await.unwrap();
    assert_eq!(decrypted.content, b"launch codes");
}

#[tokio::test]
async fn server_rejections_surface_with_message() {
    let api = spawn_server(Policy { force_one_time: true, ..Policy::default() }).await;
    let client = Client::new(&api).unwrap();

    let err = client
        .store(&Secret::new("ciphertext", Expiration::OneHour, false))
        .await
        .unwrap_err();

    assert!(
        matches!(
            &err,
            ClientError::Server { status: 400, message } if message == "Secret must be one time download"
        ),
        "{err}"
    );

    let config = client.config().await.unwrap();
    assert!(config.force_one_time_secrets);
}

#[tokio::test]
async fn delete_removes_secret() {
    let api = spawn_server(Policy::default()).await;
    let client = Client::new(&api).unwrap();

    let id = client.store(&Secret::new("ciphertext", Expiration::OneDay, false)).await.unwrap();
    assert!(!client.status(&id).await.unwrap());

    client.delete(&id).await.unwrap();

    assert!(client.fetch(&id).await.unwrap_err().is_not_found());
    assert!(client.delete(&id).await.unwrap_err().is_not_found());
}
