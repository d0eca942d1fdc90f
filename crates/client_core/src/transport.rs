use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use shared::domain::RecordKey;
use tracing::debug;
use url::Url;

use crate::error::TransportError;

/// HTTP seam for one REST collection per entity.
#[async_trait]
pub trait CollectionTransport: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<Value, TransportError>;
    async fn create(&self, path: &str, body: &Value) -> Result<(), TransportError>;
    async fn update(&self, path: &str, key: &RecordKey, body: &Value)
        -> Result<(), TransportError>;
    async fn remove(&self, path: &str, key: &RecordKey) -> Result<(), TransportError>;
}

pub struct RestTransport {
    http: Client,
    base_url: Url,
}

impl RestTransport {
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, TransportError> {
        let base_url = Url::parse(base_url.trim())?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(TransportError::Decode(format!(
                "api url must start with http:// or https://, got {base_url}"
            )));
        }
        if base_url.cannot_be_a_base() {
            return Err(TransportError::Url(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn collection_url(&self, path: &str) -> Result<Url, TransportError> {
        self.build_url(path, None)
    }

    pub fn record_url(&self, path: &str, key: &RecordKey) -> Result<Url, TransportError> {
        self.build_url(path, Some(key))
    }

    fn build_url(&self, path: &str, key: Option<&RecordKey>) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                TransportError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase)
            })?;
            segments.pop_if_empty();
            segments.extend(path.split('/').filter(|segment| !segment.is_empty()));
            if let Some(key) = key {
                segments.push(key.as_str());
            }
        }
        Ok(url)
    }
}

fn ensure_success(response: &Response) -> Result<(), TransportError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(TransportError::Status(status.as_u16()))
    }
}

#[async_trait]
impl CollectionTransport for RestTransport {
    async fn fetch(&self, path: &str) -> Result<Value, TransportError> {
        let url = self.collection_url(path)?;
        debug!(%url, "GET collection");
        let response = self.http.get(url).send().await?;
        ensure_success(&response)?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|err| TransportError::Decode(err.to_string()))
    }

    async fn create(&self, path: &str, body: &Value) -> Result<(), TransportError> {
        let url = self.collection_url(path)?;
        debug!(%url, "POST record");
        let response = self.http.post(url).json(body).send().await?;
        ensure_success(&response)
    }

    async fn update(
        &self,
        path: &str,
        key: &RecordKey,
        body: &Value,
    ) -> Result<(), TransportError> {
        let url = self.record_url(path, key)?;
        debug!(%url, "PUT record");
        let response = self.http.put(url).json(body).send().await?;
        ensure_success(&response)
    }

    async fn remove(&self, path: &str, key: &RecordKey) -> Result<(), TransportError> {
        let url = self.record_url(path, key)?;
        debug!(%url, "DELETE record");
        let response = self.http.delete(url).send().await?;
        ensure_success(&response)
    }
}
