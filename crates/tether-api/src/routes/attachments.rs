use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::header::CONTENT_TYPE,
    Json,
};
use base64::Engine as _;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use tether_types::AttachmentUpload;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Request body limit for the upload route. Leaves room for base64 overhead.
pub const UPLOAD_BODY_LIMIT: usize = 16 * 1024 * 1024;

const INVALID_PAYLOAD: &str = "Invalid attachment payload";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonUpload {
    pub thread_id: String,
    pub message_id: Option<String>,
    pub name: String,
    pub mime_type: String,
    pub data_base64: String,
}

/// Upload an attachment as JSON (`dataBase64`) or multipart form data (`file`, `threadId`)
pub async fn upload(State(state): State<Arc<AppState>>, request: Request) -> ApiResult<Json<Value>> {
    let is_json = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.contains("application/json"))
        .unwrap_or(false);

    let upload = if is_json {
        from_json(request).await?
    } else {
        from_multipart(request).await?
    };

    tracing::debug!(
        thread_id = %upload.thread_id,
        mime_type = %upload.mime_type,
        size_bytes = upload.size_bytes(),
        "Received attachment upload"
    );

    let attachment = state.engine.upload_attachment(upload).await?;
    Ok(Json(json!({ "attachment": attachment })))
}

async fn from_json(request: Request) -> ApiResult<AttachmentUpload> {
    let Json(body) = Json::<JsonUpload>::from_request(request, &())
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if body.thread_id.is_empty() {
        return Err(ApiError::BadRequest(INVALID_PAYLOAD.to_string()));
    }

    let data = base64::engine::general_purpose::STANDARD
        .decode(body.data_base64.trim())
        .map_err(|e| ApiError::BadRequest(format!("Invalid base64 data: {}", e)))?;

    let mut upload = AttachmentUpload::new(body.thread_id, body.name, body.mime_type, data);
    if let Some(message_id) = body.message_id {
        upload = upload.with_message_id(message_id);
    }
    Ok(upload)
}

async fn from_multipart(request: Request) -> ApiResult<AttachmentUpload> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut thread_id = String::new();
    let mut message_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
                file = Some((name, mime_type, data.to_vec()));
            }
            "threadId" => thread_id = read_text(field).await?,
            "messageId" => message_id = Some(read_text(field).await?),
            _ => {}
        }
    }

    let Some((name, mime_type, data)) = file else {
        return Err(ApiError::BadRequest(INVALID_PAYLOAD.to_string()));
    };
    if thread_id.is_empty() {
        return Err(ApiError::BadRequest(INVALID_PAYLOAD.to_string()));
    }

    let mut upload = AttachmentUpload::new(thread_id, name, mime_type, data);
    if let Some(message_id) = message_id.filter(|id| !id.is_empty()) {
        upload = upload.with_message_id(message_id);
    }
    Ok(upload)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> ApiResult<String> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart field: {}", e)))
}
