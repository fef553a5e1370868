//! In-memory credential store for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{CredentialStore, TokenRecord};
use crate::error::StoreError;

#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<HashMap<String, (TokenRecord, u64)>>>,
    writes: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_record(record: TokenRecord) -> Self {
        let store = Self::new();
        store
            .records
            .lock()
            .await
            .insert(super::TOKEN_KEY.into(), (record, 0));
        store
    }

    /// Record currently held under `key` and the TTL it was written with.
    pub async fn peek(&self, key: &str) -> Option<(TokenRecord, u64)> {
        self.records.lock().await.get(key).cloned()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Command("store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<TokenRecord>, StoreError> {
        self.check()?;
        Ok(self.records.lock().await.get(key).map(|(r, _)| r.clone()))
    }

    async fn set(&self, key: &str, record: &TokenRecord, ttl_secs: u64) -> Result<(), StoreError> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.records
            .lock()
            .await
            .insert(key.into(), (record.clone(), ttl_secs));
        Ok(())
    }
}
