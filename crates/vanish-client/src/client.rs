//! HTTP client for the vanish API.

use std::time::Duration;

use reqwest::Response;
use url::Url;
use vanish_proto::{
    Secret, SecretId,
    api::{ConfigResponse, MessageResponse, StatusResponse},
};

use crate::ClientError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Which route family a secret lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// `/secret`
    Text,
    /// `/file`
    File,
}

impl Payload {
    fn route(self) -> &'static str {
        match self {
            Self::Text => "secret",
            Self::File => "file",
        }
    }
}

/// Client for one vanish server.
#[derive(Debug, Clone)]
pub struct Client {
    api: Url,
    http: reqwest::Client,
}

impl Client {
    /// Create a client for the API rooted at `api_url`.
    pub fn new(api_url: &str) -> Result<Self, ClientError> {
        let mut api = Url::parse(api_url)?;
        if !api.path().ends_with('/') {
            let path = format!("{}/", api.path());
            api.set_path(&path);
        }
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self { api, http })
    }

    /// API root, always ending in `/`.
    pub fn api_url(&self) -> &Url {
        &self.api
    }

    /// Store a text secret and return its id.
    pub async fn store(&self, secret: &Secret) -> Result<SecretId, ClientError> {
        self.store_as(Payload::Text, secret).await
    }

    /// Store `secret` under the route family for `payload`.
    pub async fn store_as(&self, payload: Payload, secret: &Secret) -> Result<SecretId, ClientError> {
        let url = self.api.join(payload.route())?;
        let response = self.http.post(url).json(secret).send().await?;
        let body: MessageResponse = check(response).await?.json().await?;

        let id = SecretId::parse(&body.message)?;
        tracing::debug!(%id, "stored secret");
        Ok(id)
    }

    /// Fetch a text secret. One-time secrets are gone after this returns.
    pub async fn fetch(&self, id: &SecretId) -> Result<Secret, ClientError> {
        self.fetch_as(Payload::Text, id).await
    }

    /// Fetch a secret from the route family for `payload`.
    pub async fn fetch_as(&self, payload: Payload, id: &SecretId) -> Result<Secret, ClientError> {
        let url = self.secret_url(payload, id, "")?;
        let response = self.http.get(url).send().await?;
        Ok(check(response).await?.json().await?)
    }

    /// Whether the secret is one-time, without consuming it.
    pub async fn status(&self, id: &SecretId) -> Result<bool, ClientError> {
        let url = self.secret_url(Payload::Text, id, "/status")?;
        let response = self.http.get(url).send().await?;
        let body: StatusResponse = check(response).await?.json().await?;
        Ok(body.one_time)
    }

    /// Delete a secret before it expires.
    pub async fn delete(&self, id: &SecretId) -> Result<(), ClientError> {
        let url = self.secret_url(Payload::Text, id, "")?;
        let response = self.http.delete(url).send().await?;
        check(response).await?;
        Ok(())
    }

    /// Settings the server advertises to clients.
    pub async fn config(&self) -> Result<ConfigResponse, ClientError> {
        let url = self.api.join("config")?;
        let response = self.http.get(url).send().await?;
        Ok(check(response).await?.json().await?)
    }

    fn secret_url(&self, payload: Payload, id: &SecretId, suffix: &str) -> Result<Url, ClientError> {
        Ok(self.api.join(&format!("{}/{id}{suffix}", payload.route()))?)
    }
}

/// Turn a non-success response into [`ClientError::Server`].
async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await?;
    let message = serde_json::from_str::<MessageResponse>(&body)
        .map(|parsed| parsed.message)
        .unwrap_or(body);

    Err(ClientError::Server { status: status.as_u16(), message })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_root_gets_trailing_slash() {
        let client = Client::new("http://localhost:1337/api").unwrap();
        assert_eq!(client.api_url().as_str(), "http://localhost:1337/api/");

        let client = Client::new("http://localhost:1337").unwrap();
        assert_eq!(client.api_url().as_str(), "http://localhost:1337/");
    }

    #[test]
    fn routes_are_joined_under_root() {
        let client = Client::new("https://vanish.example/api").unwrap();
        let id = SecretId::from_random_bytes([7; 16]);

        let url = client.secret_url(Payload::File, &id, "/status").unwrap();

        assert_eq!(url.as_str(), format!("https://vanish.example/api/file/{id}/status"));
    }

    #[test]
    fn invalid_api_url() {
        assert!(matches!(Client::new("not a url"), Err(ClientError::InvalidUrl(_))));
    }
}
