use std::path::PathBuf;

use anyhow::Context;
use axum::async_trait;
use bytes::Bytes;
use uuid::Uuid;

/// Where uploaded profile photos live. Files are addressed by the generated
/// filename only; callers never see paths.
#[async_trait]
pub trait UploadStore: Send + Sync {
    /// Write the bytes under a fresh generated name and return that name.
    async fn save(&self, body: Bytes) -> anyhow::Result<String>;
    async fn read(&self, filename: &str) -> anyhow::Result<Bytes>;
    async fn delete(&self, filename: &str) -> anyhow::Result<()>;
    /// Remove every stored file, keeping the directory itself.
    async fn clear(&self) -> anyhow::Result<()>;
}

/// Local-disk store rooted at the configured upload directory.
#[derive(Clone)]
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    pub async fn new(dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("create upload directory {}", dir.display()))?;
        Ok(Self { dir })
    }
}

#[async_trait]
impl UploadStore for DiskStore {
    async fn save(&self, body: Bytes) -> anyhow::Result<String> {
        let filename = Uuid::new_v4().simple().to_string();
        let path = self.dir.join(&filename);
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write upload {}", path.display()))?;
        Ok(filename)
    }

    async fn read(&self, filename: &str) -> anyhow::Result<Bytes> {
        let path = self.dir.join(filename);
        let data = tokio::fs::read(&path)
            .await
            .with_context(|| format!("read upload {}", path.display()))?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, filename: &str) -> anyhow::Result<()> {
        let path = self.dir.join(filename);
        tokio::fs::remove_file(&path)
            .await
            .with_context(|| format!("delete upload {}", path.display()))?;
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("list upload directory {}", self.dir.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                tokio::fs::remove_file(entry.path())
                    .await
                    .with_context(|| format!("delete upload {}", entry.path().display()))?;
            }
        }
        Ok(())
    }
}

/// In-memory store for tests: no filesystem, same contract.
#[derive(Clone, Default)]
pub struct MemStore {
    files: std::sync::Arc<std::sync::Mutex<std::collections::HashMap<String, Bytes>>>,
}

impl MemStore {
    pub fn contains(&self, filename: &str) -> bool {
        self.files.lock().unwrap().contains_key(filename)
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

#[async_trait]
impl UploadStore for MemStore {
    async fn save(&self, body: Bytes) -> anyhow::Result<String> {
        let filename = Uuid::new_v4().simple().to_string();
        self.files.lock().unwrap().insert(filename.clone(), body);
        Ok(filename)
    }

    async fn read(&self, filename: &str) -> anyhow::Result<Bytes> {
        self.files
            .lock()
            .unwrap()
            .get(filename)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such upload {filename}"))
    }

    async fn delete(&self, filename: &str) -> anyhow::Result<()> {
        self.files
            .lock()
            .unwrap()
            .remove(filename)
            .map(|_| ())
            .ok_or_else(|| anyhow::anyhow!("no such upload {filename}"))
    }

    async fn clear(&self) -> anyhow::Result<()> {
        self.files.lock().unwrap().clear();
        Ok(())
    }
}
