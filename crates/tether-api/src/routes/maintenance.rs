use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::ApiResult;
use crate::state::AppState;

/// Delete threads idle for longer than the retention window
pub async fn run_retention(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let deleted = state.engine.run_retention().await?;
    Ok(Json(json!({ "deleted": deleted })))
}
