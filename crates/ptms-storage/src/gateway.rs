//! The persistence gateway trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::collection::Collection;
use crate::errors::Result;

/// Durable storage of whole collections.
///
/// Writes replace the entire document. Implementations must be safe to
/// share across tasks; callers serialize their own read-modify-write cycles.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Read a collection, or its empty default (`[]`/`{}`) when absent.
    async fn read_collection(&self, name: &str) -> Result<Value>;

    /// Replace a collection.
    async fn write_collection(&self, name: &str, value: &Value) -> Result<()>;

    /// Remove a collection. Returns `false` if it did not exist.
    async fn delete_collection(&self, name: &str) -> Result<bool>;

    /// Names of all stored collections, sorted.
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Short backend label for logs.
    fn backend(&self) -> &'static str;

    /// Typed convenience over [`read_collection`](Self::read_collection).
    async fn read(&self, collection: Collection) -> Result<Value> {
        self.read_collection(collection.name()).await
    }

    /// Typed convenience over [`write_collection`](Self::write_collection).
    async fn write(&self, collection: Collection, value: &Value) -> Result<()> {
        self.write_collection(collection.name(), value).await
    }
}
