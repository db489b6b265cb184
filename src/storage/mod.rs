//! Code/Asset Store: persists rendered report images keyed by recall code.
//!
//! One code maps to one image; re-saving overwrites (last write wins). Both
//! operations validate the code format against the configured prefix before
//! any backend call is attempted.

mod http;
mod memory;

pub use http::HttpAssetStore;
pub use memory::MemoryAssetStore;

use crate::error::StorageError;
use crate::report::CodeFormat;
use async_trait::async_trait;
use base64::Engine as _;

#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store PNG bytes under `code`, overwriting any previous image.
    async fn put(&self, code: &str, image: &[u8]) -> Result<(), StorageError>;

    /// Public URL of the image stored under `code`, or `None` when nothing
    /// is stored.
    async fn get(&self, code: &str) -> Result<Option<String>, StorageError>;
}

/// Shared pre-flight check for both store implementations.
pub(crate) fn ensure_valid_code(format: &CodeFormat, code: &str) -> Result<(), StorageError> {
    if format.is_valid(code) {
        Ok(())
    } else {
        Err(StorageError::InvalidCode {
            expected: format.expected_shape(),
        })
    }
}

/// Decode a `data:<mime>;base64,<payload>` URL from the capture client into
/// raw image bytes.
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>, StorageError> {
    let payload = data_url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, payload)| payload)
        .ok_or_else(|| {
            StorageError::InvalidImage("expected a base64 data URL".to_string())
        })?;

    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|error| StorageError::InvalidImage(error.to_string()))
}
