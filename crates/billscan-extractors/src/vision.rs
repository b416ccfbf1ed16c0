//! Vision LLM invoice extraction against Azure OpenAI chat completions.
//!
//! The image travels inline as a base64 data URI next to the extraction
//! prompt. Every failure is folded into [`ExtractionResult::Failed`].

use std::path::Path;

use async_trait::async_trait;
use billscan_core::config::chat_completions_url;
use billscan_core::{
    BillscanError, BillscanResult, ChatPayload, ExtractedItems, ExtractionConfig,
    ExtractionRequest, ExtractionResult, ImageFormat,
};
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use tracing::{debug, info, warn};

use crate::encoding::{data_uri, declared_mime, detect_format};
use crate::reply::{interpret_reply, reply_content};
use crate::Extractor;

/// Extractor backed by an Azure OpenAI vision deployment.
pub struct VisionInvoiceExtractor {
    client: Client,
    config: ExtractionConfig,
}

impl VisionInvoiceExtractor {
    /// Create an extractor whose HTTP client enforces `config.timeout`.
    pub fn new(config: ExtractionConfig) -> BillscanResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                BillscanError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Run one extraction for a fully specified request.
    ///
    /// API version, token limit and MIME policy come from the extractor's
    /// configuration; everything else comes from `request`.
    pub async fn extract_request(&self, request: &ExtractionRequest) -> ExtractionResult {
        info!(file = %request.file_path.display(), "Starting invoice extraction");

        match self.try_extract(request).await {
            Ok(items) => {
                if items.is_raw_text() {
                    warn!("Model reply was not JSON, returning raw text");
                }
                ExtractionResult::Items(items)
            }
            Err(err) => {
                warn!(
                    kind = %err.kind(),
                    error = %err,
                    file = %request.file_path.display(),
                    "Invoice extraction failed"
                );
                ExtractionResult::from(err)
            }
        }
    }

    async fn try_extract(&self, request: &ExtractionRequest) -> BillscanResult<ExtractedItems> {
        let content = tokio::fs::read(&request.file_path)
            .await
            .map_err(|e| BillscanError::local_io(&request.file_path, e))?;

        let format = detect_format(&content);
        let mime_type = declared_mime(format, self.config.image_mime);
        if format.mime_type() != Some(mime_type) {
            warn!(
                detected = ?format,
                declared = mime_type,
                "Declared image type does not match upload"
            );
        }
        if format == ImageFormat::Unknown {
            debug!(size = content.len(), "Upload is not a recognised image format");
        }

        let payload = ChatPayload::new(
            request.system_prompt.as_str(),
            request.prompt_text.as_str(),
            data_uri(mime_type, &content),
            self.config.max_tokens,
        );

        let endpoint = chat_completions_url(
            &request.api_base_url,
            &request.deployment_name,
            &self.config.api_version,
        );
        debug!(endpoint = %endpoint, bytes = content.len(), "Sending chat completion request");

        let response = self
            .client
            .post(&endpoint)
            .header("api-key", request.api_key.expose_secret().as_str())
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(BillscanError::remote_call(status.as_u16(), reason_phrase(status)));
        }

        let body = response.text().await.map_err(transport_error)?;
        let body: serde_json::Value = serde_json::from_str(&body)?;

        Ok(interpret_reply(reply_content(&body)?))
    }
}

#[async_trait]
impl Extractor for VisionInvoiceExtractor {
    async fn extract(&self, path: &Path) -> ExtractionResult {
        let request = ExtractionRequest::from_config(path, &self.config);
        self.extract_request(&request).await
    }

    fn name(&self) -> &str {
        "azure-openai-vision"
    }
}

fn reason_phrase(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}

fn transport_error(err: reqwest::Error) -> BillscanError {
    BillscanError::Transport {
        message: err.to_string(),
        timed_out: err.is_timeout(),
        source: Some(Box::new(err)),
    }
}
