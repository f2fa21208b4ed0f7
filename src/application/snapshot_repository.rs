// Repository trait for snapshot document access
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// List the ids of every stored snapshot document
    async fn list_snapshot_ids(&self) -> anyhow::Result<Vec<String>>;

    /// Load one snapshot as an untyped document, ready for validation
    async fn load_document(&self, snapshot_id: &str) -> anyhow::Result<Value>;
}
