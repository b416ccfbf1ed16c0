//! Server state management.

use std::path::PathBuf;
use std::sync::Arc;

use billscan_extractors::Extractor;

use crate::upload::UploadStore;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Shared application state.
///
/// Immutable after startup; cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    extractor: Arc<dyn Extractor>,
    uploads: UploadStore,
    max_upload_bytes: usize,
}

impl AppState {
    /// Create a new application state.
    pub fn new(extractor: Arc<dyn Extractor>, upload_dir: impl Into<PathBuf>) -> Self {
        Self::with_limits(extractor, upload_dir, DEFAULT_MAX_UPLOAD_BYTES)
    }

    /// Create state with an explicit request body limit.
    pub fn with_limits(
        extractor: Arc<dyn Extractor>,
        upload_dir: impl Into<PathBuf>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                extractor,
                uploads: UploadStore::new(upload_dir),
                max_upload_bytes,
            }),
        }
    }

    pub fn extractor(&self) -> &dyn Extractor {
        self.inner.extractor.as_ref()
    }

    pub fn uploads(&self) -> &UploadStore {
        &self.inner.uploads
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.inner.max_upload_bytes
    }
}
