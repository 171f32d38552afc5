use std::path::{Path, PathBuf};

use bytes::Bytes;
use time::OffsetDateTime;
use tokio::{
    fs,
    io::{AsyncWrite, AsyncWriteExt},
};
use tracing::{debug, info, warn};

/// URL prefix under which stored photos are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Only image files can be uploaded (jpeg, jpg, png, gif).")]
    InvalidType,
    #[error("write upload {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Photo storage rooted at a directory on local disk.
#[derive(Debug, Clone)]
pub struct LocalPhotoStorage {
    root: PathBuf,
}

impl LocalPhotoStorage {
    /// Creates the directory if it does not exist yet. Safe to call repeatedly.
    pub async fn init(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            anyhow::anyhow!("create upload dir {}: {}", root.display(), e)
        })?;
        info!(dir = %root.display(), "upload directory ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `body` as `<unix-millis>.<ext>` and returns the public relative path.
    ///
    /// The file is opened with create-new, so two uploads landing on the same
    /// millisecond fail instead of overwriting each other.
    pub async fn put_photo(&self, body: Bytes, ext: &str) -> Result<String, UploadError> {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let file_name = format!("{}.{}", millis, ext);
        let path = self.root.join(&file_name);

        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|source| UploadError::Io {
                path: path.clone(),
                source,
            })?;
        write_or_remove(file, &path, &body)
            .await
            .map_err(|source| UploadError::Io {
                path: path.clone(),
                source,
            })?;

        debug!(file = %file_name, bytes = body.len(), "photo stored");
        Ok(format!("{}/{}", PUBLIC_PREFIX, file_name))
    }

    /// Removes a photo previously returned by [`put_photo`](Self::put_photo).
    /// Failures are logged and otherwise ignored.
    pub async fn discard(&self, public_path: &str) {
        let Some(file_name) = public_path
            .strip_prefix(PUBLIC_PREFIX)
            .and_then(|p| p.strip_prefix('/'))
        else {
            return;
        };
        if file_name.is_empty() || file_name.contains('/') {
            return;
        }
        if let Err(e) = fs::remove_file(self.root.join(file_name)).await {
            warn!(error = %e, file = %file_name, "failed to discard photo");
        }
    }
}

/// Writes `body` to `out`, deleting `path` if the write does not complete.
async fn write_or_remove<W: AsyncWrite + Unpin>(
    mut out: W,
    path: &Path,
    body: &[u8],
) -> std::io::Result<()> {
    let written = async {
        out.write_all(body).await?;
        out.flush().await
    }
    .await;
    if let Err(e) = written {
        drop(out);
        if let Err(rm) = fs::remove_file(path).await {
            warn!(error = %rm, path = %path.display(), "failed to remove partial upload");
        }
        return Err(e);
    }
    Ok(())
}
