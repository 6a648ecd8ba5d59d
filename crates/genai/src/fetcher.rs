//! Resolves image references to bytes.

use async_trait::async_trait;
use kana_core::data_url;
use kana_core::error::CoreError;
use kana_core::generation::ImageFetcher;

use crate::api::GenAiError;

/// Fetcher handling inline `data:` URLs locally and `http(s)` URLs over
/// the network.
#[derive(Debug, Clone, Default)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch_remote(&self, url: &str) -> Result<Vec<u8>, GenAiError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenAiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CoreError> {
        if data_url::is_data_url(url) {
            return Ok(data_url::decode(url)?.bytes);
        }
        if url.starts_with("http://") || url.starts_with("https://") {
            return Ok(self.fetch_remote(url).await?);
        }
        Err(CoreError::Validation(format!(
            "Unsupported image URL scheme: {}",
            url.split(':').next().unwrap_or_default()
        )))
    }
}
