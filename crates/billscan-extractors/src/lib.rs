//! billscan-extractors - Invoice extraction through a vision language model.
//!
//! The adapter reads an uploaded image, sends it inline to an Azure OpenAI
//! chat completions deployment, and turns the reply into an
//! [`ExtractionResult`]. Failures never escape as errors; they come back as
//! a failed result carrying an [`ErrorKind`](billscan_core::ErrorKind).
//!
//! # Example
//!
//! ```ignore
//! use billscan_extractors::{Extractor, VisionInvoiceExtractor};
//!
//! let extractor = VisionInvoiceExtractor::new(ExtractionConfig::from_env()?)?;
//! let result = extractor.extract(Path::new("uploads/3f2a.png")).await;
//! println!("{}", serde_json::to_string(&result)?);
//! ```

pub mod encoding;
pub mod reply;
mod vision;

pub use encoding::{data_uri, declared_mime, detect_format};
pub use reply::{interpret_reply, reply_content};
pub use vision::VisionInvoiceExtractor;

use std::path::Path;

use async_trait::async_trait;
use billscan_core::ExtractionResult;

/// Core Extractor trait - turns an image on disk into extracted items.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract items from the file at `path`.
    ///
    /// Never fails: problems are reported as [`ExtractionResult::Failed`].
    async fn extract(&self, path: &Path) -> ExtractionResult;

    /// Human-readable name for this extractor.
    fn name(&self) -> &str;
}
