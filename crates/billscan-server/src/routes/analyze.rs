//! Invoice upload endpoint.

use axum::{
    extract::{
        multipart::{Multipart, MultipartError, MultipartRejection},
        State,
    },
    Json,
};
use billscan_core::{BillscanError, ExtractionResult};
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Name of the multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

/// A file pulled out of the multipart body.
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub content: Vec<u8>,
}

/// Extract invoice items from an uploaded image.
/// POST /analyze
///
/// Responds 400 when no `file` upload is present. Extraction failures are
/// still answered with 200 and an `error` body.
pub async fn analyze_invoice(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ExtractionResult>> {
    info!("Received a request to /analyze");

    let mut multipart = multipart.map_err(|rejection| {
        debug!(reason = %rejection, "Request body is not multipart");
        ApiError::from(BillscanError::MissingFile)
    })?;

    let file = read_file_field(&mut multipart)
        .await?
        .ok_or(BillscanError::MissingFile)?;

    let upload = state
        .uploads()
        .persist(Some(file.file_name.as_str()), &file.content)
        .await?;
    drop(file);

    let result = state.extractor().extract(upload.path()).await;

    if let Err(err) = upload.remove().await {
        warn!(kind = %err.kind(), error = %err, "Failed to remove transient upload");
    }

    match result.error_kind() {
        Some(kind) => info!(kind = %kind, "Extraction finished with error"),
        None => info!("Extraction finished"),
    }

    Ok(Json(result))
}

/// Read the first `file` part that carries a filename.
///
/// Other fields, and a `file` part sent as a plain form value, are skipped.
async fn read_file_field(multipart: &mut Multipart) -> ApiResult<Option<UploadedFile>> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_string) else {
            debug!("Skipping `file` form value without a filename");
            continue;
        };

        let content = field.bytes().await.map_err(multipart_error)?.to_vec();
        return Ok(Some(UploadedFile { file_name, content }));
    }

    Ok(None)
}

fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::new(err.status(), "BAD_MULTIPART", err.body_text())
}
