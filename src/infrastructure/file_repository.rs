// File-backed snapshot repository: one <id>.json document per snapshot
use crate::application::snapshot_repository::SnapshotRepository;
use crate::infrastructure::document::parse_document;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};

const DOCUMENT_EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct FileSnapshotRepository {
    directory: PathBuf,
}

impl FileSnapshotRepository {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn document_path(&self, snapshot_id: &str) -> Result<PathBuf> {
        let is_plain_name = !snapshot_id.is_empty()
            && snapshot_id != "."
            && !snapshot_id.contains("..")
            && !snapshot_id.contains(['/', '\\']);
        if !is_plain_name {
            anyhow::bail!("Invalid snapshot id {:?}", snapshot_id);
        }
        Ok(self
            .directory
            .join(format!("{snapshot_id}.{DOCUMENT_EXTENSION}")))
    }
}

#[async_trait]
impl SnapshotRepository for FileSnapshotRepository {
    async fn list_snapshot_ids(&self) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.directory)
            .await
            .with_context(|| format!("Failed to read snapshot directory {}", self.directory.display()))?;

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(DOCUMENT_EXTENSION) {
                continue;
            }
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }

        ids.sort();
        tracing::debug!(
            "Found {} snapshot documents in {}",
            ids.len(),
            self.directory.display()
        );
        Ok(ids)
    }

    async fn load_document(&self, snapshot_id: &str) -> Result<Value> {
        let path = self.document_path(snapshot_id)?;
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;

        parse_document(&bytes).with_context(|| format!("Failed to parse snapshot {snapshot_id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_and_load_documents() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("kafue.json"), br#"{"version": "1.0.0"}"#)
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("luangwa.json"), b"{}").await.unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), b"ignored").await.unwrap();

        let repository = FileSnapshotRepository::new(dir.path());
        let ids = repository.list_snapshot_ids().await.unwrap();
        assert_eq!(ids, vec!["kafue".to_string(), "luangwa".to_string()]);

        let document = repository.load_document("kafue").await.unwrap();
        assert_eq!(document["version"], "1.0.0");
    }

    #[tokio::test]
    async fn test_refuses_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let repository = FileSnapshotRepository::new(dir.path());

        for id in ["../secrets", "nested/kafue", "", ".."] {
            let err = repository.load_document(id).await.unwrap_err();
            assert!(err.to_string().contains("Invalid snapshot id"), "{id}: {err}");
        }
    }

    #[tokio::test]
    async fn test_unparseable_document_reports_id() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("broken.json"), b"{\"widgets\": [")
            .await
            .unwrap();

        let repository = FileSnapshotRepository::new(dir.path());
        let err = repository.load_document("broken").await.unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let repository = FileSnapshotRepository::new("/nonexistent/snapshots");
        assert!(repository.list_snapshot_ids().await.is_err());
    }
}
