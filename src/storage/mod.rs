//! Storage
//!
//! JSON documents on disk: one file per listing plus the taste model and its
//! distilled prose companion. Every write goes through [`write_atomic`].

pub mod listing_store;
pub mod taste_store;

pub use listing_store::ListingStore;
pub use taste_store::TasteStore;

use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Suffix carried by in-flight temporary files. Readers skip these.
pub(crate) const TEMP_SUFFIX: &str = ".tmp";

/// Replace `path` with `contents` so that a crash leaves either the old or the
/// new document, never a torn one.
pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .context("Target path has no parent directory")?;
    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("Target path has no file name")?;
    let temp_path = dir.join(format!(".{}.{}{}", file_name, uuid::Uuid::new_v4(), TEMP_SUFFIX));

    let mut file = fs::File::create(&temp_path)
        .await
        .with_context(|| format!("Failed to create temp file {}", temp_path.display()))?;
    let written = async {
        file.write_all(contents).await?;
        file.sync_all().await?;
        Ok::<_, std::io::Error>(())
    }
    .await;
    drop(file);

    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e).with_context(|| format!("Failed to write {}", temp_path.display()));
    }

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_atomic_replaces_and_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");

        write_atomic(&path, b"first").await.unwrap();
        write_atomic(&path, b"second").await.unwrap();

        assert_eq!(fs::read_to_string(&path).await.unwrap(), "second");
        let mut entries = fs::read_dir(path.parent().unwrap()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        assert_eq!(names, vec!["doc.json".to_string()]);
    }
}
