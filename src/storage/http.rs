//! Bucket-backed asset store speaking plain `PUT`/`GET` against an
//! object-storage HTTP endpoint.

use super::{AssetStore, ensure_valid_code};
use crate::config::StorageConfig;
use crate::error::StorageError;
use crate::llm::http_client::build_client_with_timeout;
use crate::report::CodeFormat;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

pub struct HttpAssetStore {
    client: Client,
    base_url: String,
    object_prefix: String,
    /// Pre-computed `"Bearer <key>"` header value.
    cached_auth_header: Option<String>,
    format: CodeFormat,
}

impl HttpAssetStore {
    pub fn new(base_url: impl Into<String>, config: &StorageConfig, format: CodeFormat) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: build_client_with_timeout(30),
            base_url,
            object_prefix: config.object_prefix.clone(),
            cached_auth_header: config.api_key.as_deref().map(|k| format!("Bearer {k}")),
            format,
        }
    }

    fn object_url(&self, code: &str) -> String {
        format!("{}/{}/{code}.png", self.base_url, self.object_prefix)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.cached_auth_header {
            Some(header) => builder.header("Authorization", header),
            None => builder,
        }
    }
}

#[async_trait]
impl AssetStore for HttpAssetStore {
    async fn put(&self, code: &str, image: &[u8]) -> Result<(), StorageError> {
        ensure_valid_code(&self.format, code)?;

        let url = self.object_url(code);
        let response = self
            .authorize(self.client.put(&url))
            .header("Content-Type", "image/png")
            .body(image.to_vec())
            .send()
            .await
            .map_err(|error| StorageError::Backend(error.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(code, bytes = image.len(), "report image stored");
            Ok(())
        } else {
            Err(StorageError::Backend(format!(
                "upload of {code} rejected with {status}"
            )))
        }
    }

    async fn get(&self, code: &str) -> Result<Option<String>, StorageError> {
        ensure_valid_code(&self.format, code)?;

        let url = self.object_url(code);
        let response = self
            .authorize(self.client.head(&url))
            .send()
            .await
            .map_err(|error| StorageError::Backend(error.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(Some(url)),
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(StorageError::Backend(format!(
                "lookup of {code} failed with {status}"
            ))),
        }
    }
}
