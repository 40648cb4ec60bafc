use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use super::write_atomic;
use crate::models::TasteModel;

/// The taste model document and the distilled `aesthetics.md` beside it.
#[derive(Debug, Clone)]
pub struct TasteStore {
    taste_file: PathBuf,
    aesthetics_file: PathBuf,
}

impl TasteStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            taste_file: data_dir.join("taste.json"),
            aesthetics_file: data_dir.join("aesthetics.md"),
        }
    }

    pub fn exists(&self) -> bool {
        self.taste_file.exists()
    }

    pub async fn load(&self) -> Result<Option<TasteModel>> {
        let Some(json) = read_optional(&self.taste_file).await? else {
            return Ok(None);
        };
        let taste = serde_json::from_str(&json)
            .with_context(|| format!("Failed to deserialize {}", self.taste_file.display()))?;
        Ok(Some(taste))
    }

    pub async fn save(&self, taste: &TasteModel) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(taste).context("Failed to serialize taste model")?;
        write_atomic(&self.taste_file, json.as_bytes()).await?;
        Ok(self.taste_file.clone())
    }

    /// Load the taste model, creating and persisting the default one first
    /// when none exists yet.
    pub async fn load_or_create(&self) -> Result<TasteModel> {
        if let Some(taste) = self.load().await? {
            return Ok(taste);
        }
        let taste = TasteModel::default();
        self.save(&taste).await?;
        info!("Created default taste model at {}", self.taste_file.display());
        Ok(taste)
    }

    pub async fn save_aesthetics(&self, content: &str) -> Result<PathBuf> {
        write_atomic(&self.aesthetics_file, content.as_bytes()).await?;
        Ok(self.aesthetics_file.clone())
    }

    pub async fn load_aesthetics(&self) -> Result<Option<String>> {
        read_optional(&self.aesthetics_file).await
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_or_create_persists_default() {
        let dir = tempdir().unwrap();
        let store = TasteStore::new(dir.path());
        assert!(!store.exists());
        assert!(store.load().await.unwrap().is_none());

        let created = store.load_or_create().await.unwrap();
        assert!(store.exists());
        assert_eq!(created.dimensions.len(), 10);

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, created);
    }

    #[tokio::test]
    async fn test_save_keeps_changes() {
        let dir = tempdir().unwrap();
        let store = TasteStore::new(dir.path());

        let mut taste = store.load_or_create().await.unwrap();
        taste.principles.push("Honest materials".to_string());
        taste.bump_version();
        store.save(&taste).await.unwrap();

        let loaded = store.load_or_create().await.unwrap();
        assert_eq!(loaded.version, 2);
        assert_eq!(loaded.principles, vec!["Honest materials".to_string()]);
    }

    #[tokio::test]
    async fn test_aesthetics_round_trip() {
        let dir = tempdir().unwrap();
        let store = TasteStore::new(dir.path());
        assert!(store.load_aesthetics().await.unwrap().is_none());

        store.save_aesthetics("# Aesthetics\n\nLight first.").await.unwrap();
        let text = store.load_aesthetics().await.unwrap().unwrap();
        assert!(text.contains("Light first."));
    }
}
