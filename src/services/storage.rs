use crate::utils::validation::sanitize_filename;
use anyhow::Result;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

/// Uploaded scans on local disk, addressed by sanitized filename.
///
/// A repeated filename replaces the previous file; concurrent writers race
/// and the last rename wins.
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Persists `data` under `filename` (already sanitized) and returns the
    /// stored path. Data lands in a temporary sibling first and is renamed
    /// into place.
    pub async fn save(&self, filename: &str, data: &[u8]) -> Result<PathBuf> {
        let path = self.root.join(filename);
        let staging = tempfile::Builder::new()
            .prefix(".upload_")
            .tempfile_in(&self.root)?;

        let (std_file, temp_path) = staging.into_parts();
        let mut file = tokio::fs::File::from_std(std_file);
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        temp_path.persist(&path)?;
        tracing::debug!("Stored upload {} ({} bytes)", path.display(), data.len());
        Ok(path)
    }

    /// Resolves a retrieval request to an existing file. Names that do not
    /// survive sanitization unchanged are refused.
    pub async fn resolve(&self, filename: &str) -> Option<PathBuf> {
        let clean = sanitize_filename(filename).ok()?;
        if clean != filename {
            return None;
        }
        let path = self.root.join(clean);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Some(path),
            _ => None,
        }
    }
}
