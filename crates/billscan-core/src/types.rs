//! Wire and result types for invoice extraction.

use std::path::PathBuf;

use secrecy::SecretString;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::config::ExtractionConfig;
use crate::error::{BillscanError, ErrorKind};

/// Everything one adapter invocation needs.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub file_path: PathBuf,
    pub prompt_text: String,
    /// Base URL of the provider, expected to end with `/`.
    pub api_base_url: String,
    pub deployment_name: String,
    pub api_key: SecretString,
    pub system_prompt: String,
}

impl ExtractionRequest {
    /// Build a request for `file_path` from the process configuration.
    pub fn from_config(file_path: impl Into<PathBuf>, config: &ExtractionConfig) -> Self {
        Self {
            file_path: file_path.into(),
            prompt_text: config.prompt.clone(),
            api_base_url: config.api_base_url.clone(),
            deployment_name: config.deployment.clone(),
            api_key: config.api_key.clone(),
            system_prompt: config.system_prompt.clone(),
        }
    }
}

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

/// Content of a chat message: plain text or typed parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// One typed part of a user message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: MessageContent,
}

/// Request body for the chat completions endpoint.
///
/// Always one system message followed by one user message whose content is
/// a text part and an inline image part.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatPayload {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

impl ChatPayload {
    /// Create a payload from the prompts and an image data URI.
    pub fn new(
        system_prompt: impl Into<String>,
        prompt_text: impl Into<String>,
        image_data_uri: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        Self {
            messages: vec![
                ChatMessage {
                    role: MessageRole::System,
                    content: MessageContent::Text(system_prompt.into()),
                },
                ChatMessage {
                    role: MessageRole::User,
                    content: MessageContent::Parts(vec![
                        ContentPart::Text {
                            text: prompt_text.into(),
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl {
                                url: image_data_uri.into(),
                            },
                        },
                    ]),
                },
            ],
            max_tokens,
        }
    }
}

/// Image encoding detected from the uploaded bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
    Unknown,
}

impl ImageFormat {
    /// MIME type for the data URI, `None` for unknown content.
    pub fn mime_type(&self) -> Option<&'static str> {
        match self {
            ImageFormat::Png => Some("image/png"),
            ImageFormat::Jpeg => Some("image/jpeg"),
            ImageFormat::Gif => Some("image/gif"),
            ImageFormat::Webp => Some("image/webp"),
            ImageFormat::Unknown => None,
        }
    }
}

/// Items pulled out of the model reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedItems {
    /// The reply parsed as JSON; any JSON value is accepted.
    Structured(serde_json::Value),
    /// The reply was not JSON and is passed through as text.
    RawText(String),
}

impl ExtractedItems {
    pub fn is_raw_text(&self) -> bool {
        matches!(self, ExtractedItems::RawText(_))
    }
}

impl Serialize for ExtractedItems {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ExtractedItems::Structured(value) => value.serialize(serializer),
            ExtractedItems::RawText(text) => {
                #[derive(Serialize)]
                struct Info<'a> {
                    info: &'a str,
                }
                [Info { info: text }].serialize(serializer)
            }
        }
    }
}

/// Outcome of one extraction.
///
/// Serializes to `{"items": ...}` or `{"error": "..."}`; the error kind is
/// kept for logging and never written to the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult {
    Items(ExtractedItems),
    Failed { kind: ErrorKind, message: String },
}

impl ExtractionResult {
    /// Error kind of a failed result.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            ExtractionResult::Failed { kind, .. } => Some(*kind),
            ExtractionResult::Items(_) => None,
        }
    }
}

impl From<BillscanError> for ExtractionResult {
    fn from(err: BillscanError) -> Self {
        ExtractionResult::Failed {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl Serialize for ExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            ExtractionResult::Items(items) => map.serialize_entry("items", items)?,
            ExtractionResult::Failed { message, .. } => map.serialize_entry("error", message)?,
        }
        map.end()
    }
}
