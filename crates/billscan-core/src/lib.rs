//! billscan-core - Core library for billscan.
//!
//! This crate provides the configuration, error taxonomy, and wire types
//! shared by the extraction adapter and the HTTP server.
//!
//! # Example
//!
//! ```ignore
//! use billscan_core::{ExtractionConfig, ExtractionRequest};
//!
//! let config = ExtractionConfig::from_env()?;
//! let request = ExtractionRequest::from_config("uploads/3f2a.png", &config);
//! ```

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{ExtractionConfig, ImageMimePolicy, LogFormat, ServerConfig};
pub use error::{BillscanError, BillscanResult, ErrorKind};
pub use types::{
    ChatMessage, ChatPayload, ContentPart, ExtractedItems, ExtractionRequest, ExtractionResult,
    ImageFormat, ImageUrl, MessageContent, MessageRole,
};
