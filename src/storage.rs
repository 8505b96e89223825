use async_trait::async_trait;
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("not_found")]
    NotFound,
    #[error("other: {0}")]
    Other(String),
}

/// Fixed partitions of the upload directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    LostFound,
    Complaints,
    Menu,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::LostFound, Bucket::Complaints, Bucket::Menu];

    pub fn dir_name(self) -> &'static str {
        match self {
            Bucket::LostFound => "lost_found",
            Bucket::Complaints => "complaints",
            Bucket::Menu => "menu",
        }
    }

    fn file_prefix(self) -> &'static str {
        match self {
            Bucket::Menu => "menu_",
            _ => "",
        }
    }
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist `bytes` under a generated name and return the storage path.
    async fn save(
        &self,
        bucket: Bucket,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<String, ImageStoreError>;
    async fn load(&self, path: &str) -> Result<Vec<u8>, ImageStoreError>;
    async fn delete(&self, path: &str) -> Result<(), ImageStoreError>;
}

/// Reduce an uploaded filename to `[A-Za-z0-9._-]`, dropping any directory part.
/// Leading dots and underscores are trimmed so the result is never hidden or `..`.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    cleaned.trim_start_matches(['.', '_']).to_string()
}

// ---------------- Filesystem Implementation ----------------
pub struct FsImageStore {
    base: PathBuf,
}

impl FsImageStore {
    /// Create the base directory and every bucket directory (idempotent).
    pub async fn new(base: impl Into<PathBuf>) -> std::io::Result<Self> {
        let base = base.into();
        for bucket in Bucket::ALL {
            tokio::fs::create_dir_all(base.join(bucket.dir_name())).await?;
        }
        info!("upload directory ready at '{}'", base.display());
        Ok(Self { base })
    }

    fn file_name(bucket: Bucket, original_name: &str, attempt: u32) -> String {
        let ts = chrono::Utc::now().timestamp_micros();
        let safe = sanitize_filename(original_name);
        match attempt {
            0 => format!("{}{ts}_{safe}", bucket.file_prefix()),
            n => format!("{}{ts}-{n}_{safe}", bucket.file_prefix()),
        }
    }
}

const MAX_NAME_ATTEMPTS: u32 = 16;

#[async_trait]
impl ImageStore for FsImageStore {
    async fn save(
        &self,
        bucket: Bucket,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<String, ImageStoreError> {
        let dir = self.base.join(bucket.dir_name());
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = dir.join(Self::file_name(bucket, original_name, attempt));
            let mut file = match tokio::fs::OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(f) => f,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    error!("create failed path={} err={e}", path.display());
                    return Err(ImageStoreError::Other(e.to_string()));
                }
            };
            let written = match file.write_all(bytes).await {
                Ok(()) => file.flush().await,
                Err(e) => Err(e),
            };
            if let Err(e) = written {
                error!("write failed path={} err={e}", path.display());
                let _ = tokio::fs::remove_file(&path).await;
                return Err(ImageStoreError::Other(e.to_string()));
            }
            return Ok(path.to_string_lossy().into_owned());
        }
        Err(ImageStoreError::Other(format!(
            "no free file name in bucket '{}' after {MAX_NAME_ATTEMPTS} attempts",
            bucket.dir_name()
        )))
    }

    async fn load(&self, path: &str) -> Result<Vec<u8>, ImageStoreError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("stored image missing path={path}");
                Err(ImageStoreError::NotFound)
            }
            Err(e) => Err(ImageStoreError::Other(e.to_string())),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), ImageStoreError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            // already gone counts as deleted
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ImageStoreError::Other(e.to_string())),
        }
    }
}

// Factory helper used in main; a missing upload directory is fatal at startup.
pub async fn build_image_store(base: &Path) -> anyhow::Result<Arc<dyn ImageStore>> {
    let store = FsImageStore::new(base)
        .await
        .map_err(|e| anyhow::anyhow!("failed to create upload directories under '{}': {e}", base.display()))?;
    Ok(Arc::new(store))
}
