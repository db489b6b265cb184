//! In-process asset store. Backs local development runs (no bucket
//! configured) and the test suite. Contents do not survive a restart.

use super::{AssetStore, ensure_valid_code};
use crate::error::StorageError;
use crate::report::CodeFormat;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

pub struct MemoryAssetStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    format: CodeFormat,
}

impl MemoryAssetStore {
    pub fn new(format: CodeFormat) -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            format,
        }
    }

    /// Raw stored bytes, for assertions in tests.
    pub fn stored_bytes(&self, code: &str) -> Option<Vec<u8>> {
        self.objects.lock().expect("store lock").get(code).cloned()
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn put(&self, code: &str, image: &[u8]) -> Result<(), StorageError> {
        ensure_valid_code(&self.format, code)?;
        self.objects
            .lock()
            .expect("store lock")
            .insert(code.to_string(), image.to_vec());
        Ok(())
    }

    async fn get(&self, code: &str) -> Result<Option<String>, StorageError> {
        ensure_valid_code(&self.format, code)?;
        let found = self.objects.lock().expect("store lock").contains_key(code);
        Ok(found.then(|| format!("memory://reports/{code}.png")))
    }
}
