//! Transient storage for uploaded files.
//!
//! Each upload is written under a fresh UUID so client-supplied names never
//! become path segments and concurrent uploads never share a file.

use std::path::{Path, PathBuf};

use billscan_core::{BillscanError, BillscanResult};
use tracing::{debug, warn};
use uuid::Uuid;

/// Directory that holds in-flight uploads.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `content` to a new file in the store.
    ///
    /// The returned guard deletes the file when removed or dropped.
    pub async fn persist(
        &self,
        client_file_name: Option<&str>,
        content: &[u8],
    ) -> BillscanResult<TransientUpload> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| BillscanError::local_io(&self.dir, e))?;

        let mut file_name = Uuid::new_v4().to_string();
        if let Some(ext) = client_file_name.and_then(safe_extension) {
            file_name.push('.');
            file_name.push_str(&ext);
        }

        let path = self.dir.join(file_name);
        // Guard first so a failed write does not leave a partial file.
        let upload = TransientUpload {
            path,
            removed: false,
        };
        tokio::fs::write(&upload.path, content)
            .await
            .map_err(|e| BillscanError::local_io(&upload.path, e))?;

        debug!(
            path = %upload.path.display(),
            client_file_name = client_file_name.unwrap_or(""),
            size = content.len(),
            "Stored transient upload"
        );
        Ok(upload)
    }
}

/// A file in the upload store, deleted on [`TransientUpload::remove`] or drop.
#[derive(Debug)]
pub struct TransientUpload {
    path: PathBuf,
    removed: bool,
}

impl TransientUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now and report failures.
    pub async fn remove(mut self) -> BillscanResult<()> {
        self.removed = true;
        tokio::fs::remove_file(&self.path)
            .await
            .map_err(|e| BillscanError::local_io(&self.path, e))?;
        debug!(path = %self.path.display(), "Removed transient upload");
        Ok(())
    }
}

impl Drop for TransientUpload {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove transient upload"),
        }
    }
}

/// Lowercased extension of a client file name, if it is short and alphanumeric.
fn safe_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 5 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
