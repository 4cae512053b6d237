//! Primary store with a local cache behind it.
//!
//! Reads and writes go to the primary. Successful writes are mirrored into
//! the cache. When the primary is unreachable, reads are served from the
//! cache and writes land only in the cache; those writes are lost if the
//! primary never comes back and the cache is discarded.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::errors::Result;
use crate::gateway::PersistenceGateway;

/// Remote-first gateway with offline fallback.
pub struct FallbackStore {
    primary: Arc<dyn PersistenceGateway>,
    cache: Arc<dyn PersistenceGateway>,
}

impl FallbackStore {
    /// Combine a primary gateway with a cache.
    pub fn new(primary: Arc<dyn PersistenceGateway>, cache: Arc<dyn PersistenceGateway>) -> Self {
        Self { primary, cache }
    }

    async fn mirror(&self, name: &str, value: &Value) {
        if let Err(e) = self.cache.write_collection(name, value).await {
            warn!(collection = name, cache = self.cache.backend(), error = %e, "failed to mirror write to cache");
        }
    }
}

#[async_trait]
impl PersistenceGateway for FallbackStore {
    async fn read_collection(&self, name: &str) -> Result<Value> {
        match self.primary.read_collection(name).await {
            Err(e) if e.is_unavailable() => {
                warn!(collection = name, error = %e, "primary unavailable, reading from cache");
                self.cache.read_collection(name).await
            }
            other => other,
        }
    }

    async fn write_collection(&self, name: &str, value: &Value) -> Result<()> {
        match self.primary.write_collection(name, value).await {
            Ok(()) => {
                self.mirror(name, value).await;
                Ok(())
            }
            Err(e) if e.is_unavailable() => {
                warn!(collection = name, error = %e, "primary unavailable, writing to cache only");
                self.cache.write_collection(name, value).await
            }
            Err(e) => Err(e),
        }
    }

    async fn delete_collection(&self, name: &str) -> Result<bool> {
        match self.primary.delete_collection(name).await {
            Ok(existed) => {
                if let Err(e) = self.cache.delete_collection(name).await {
                    warn!(collection = name, error = %e, "failed to delete from cache");
                }
                Ok(existed)
            }
            Err(e) if e.is_unavailable() => {
                warn!(collection = name, error = %e, "primary unavailable, deleting from cache only");
                self.cache.delete_collection(name).await
            }
            Err(e) => Err(e),
        }
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        match self.primary.list_collections().await {
            Err(e) if e.is_unavailable() => {
                warn!(error = %e, "primary unavailable, listing cache");
                self.cache.list_collections().await
            }
            other => other,
        }
    }

    fn backend(&self) -> &'static str {
        "fallback"
    }
}
