use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, Sse},
    Json,
};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use tether_engine::{FrameStream, SendRequest};
use tether_types::Message;

use crate::config::StreamFormat;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::ui::UiEvent;

const DEFAULT_SESSION_ID: &str = "anonymous";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Thread id
    #[serde(default)]
    pub id: String,
    pub session_id: Option<String>,
    pub model: Option<String>,
    pub provider_id: Option<String>,
    pub message: Option<Message>,
}

/// Send a message and stream the generation using Server-Sent Events
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let message = match req.message {
        Some(message) if !req.id.is_empty() => message,
        _ => return Err(ApiError::BadRequest("Invalid request payload".to_string())),
    };

    let model = req
        .model
        .unwrap_or_else(|| state.config.providers.default_model.clone());
    let mut request = SendRequest::new(
        req.id.as_str(),
        req.session_id.unwrap_or_else(|| DEFAULT_SESSION_ID.to_string()),
        message,
    )
    .with_model(model);
    if let Some(provider_id) = req.provider_id {
        request = request.with_provider(provider_id);
    }

    let frames = state.engine.send(request).await?;
    Ok(into_sse(frames, state.config.stream.format, req.id))
}

/// Reattach to a thread's generation from `?cursor=N`
///
/// A missing or unparsable cursor means 0.
pub async fn resume(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let cursor = params
        .get("cursor")
        .and_then(|c| c.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let frames = state.engine.resume(&thread_id, cursor).await?;
    Ok(into_sse(frames, state.config.stream.format, thread_id))
}

fn into_sse(
    frames: FrameStream,
    format: StreamFormat,
    text_id: String,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = frames.map(move |frame| {
        let data = match format {
            StreamFormat::Core => frame.to_json(),
            StreamFormat::Ui => UiEvent::from_frame(&text_id, &frame).to_json(),
        };
        Ok::<Event, Infallible>(Event::default().data(data))
    });

    Sse::new(events)
}
