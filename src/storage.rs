use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncWriteExt;

/// Seam between upload handling and whatever holds the bytes.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Store an object under `name`. Fails if an object with that name
    /// already exists.
    async fn put_object(&self, name: &str, body: Bytes) -> anyhow::Result<()>;

    /// Publicly resolvable URL for a stored object.
    fn public_url(&self, name: &str) -> String;
}

/// Filesystem-backed storage; objects land in `root` and are served
/// statically under `<base_url>/uploads/`.
pub struct LocalStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl StorageClient for LocalStorage {
    async fn put_object(&self, name: &str, body: Bytes) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .context("create upload directory")?;

        let path = self.root.join(name);
        // create_new refuses to clobber an existing object
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .with_context(|| format!("create {}", path.display()))?;
        file.write_all(&body)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        file.flush()
            .await
            .with_context(|| format!("flush {}", path.display()))?;
        Ok(())
    }

    fn public_url(&self, name: &str) -> String {
        format!("{}/uploads/{}", self.base_url, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_storage() -> (LocalStorage, PathBuf) {
        let root = std::env::temp_dir().join(format!("ponyapi-storage-{}", Uuid::new_v4()));
        let storage = LocalStorage::new(&root, "http://localhost:3000/");
        (storage, root)
    }

    #[tokio::test]
    async fn put_object_writes_the_bytes() {
        let (storage, root) = scratch_storage();

        storage
            .put_object("pony.png", Bytes::from_static(b"not really a png"))
            .await
            .expect("first write succeeds");

        let on_disk = tokio::fs::read(root.join("pony.png")).await.expect("read back");
        assert_eq!(on_disk, b"not really a png");

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn put_object_refuses_to_overwrite() {
        let (storage, root) = scratch_storage();

        storage
            .put_object("pony.png", Bytes::from_static(b"first"))
            .await
            .expect("first write succeeds");
        let err = storage
            .put_object("pony.png", Bytes::from_static(b"second"))
            .await;
        assert!(err.is_err());

        let on_disk = tokio::fs::read(root.join("pony.png")).await.expect("read back");
        assert_eq!(on_disk, b"first");

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn public_url_joins_base_and_name() {
        let (storage, _root) = scratch_storage();
        assert_eq!(
            storage.public_url("123-abc.png"),
            "http://localhost:3000/uploads/123-abc.png"
        );
    }
}
