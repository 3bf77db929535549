//! Owner-scoped notes endpoints.
//!
//! Every route resolves the caller first and scopes SQL to their id. A note
//! owned by someone else is indistinguishable from one that does not exist.

use super::{json_body, AppState};
use crate::error::{ApiError, ApiResult};
use crate::gateway::authn::AuthUser;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", axum::routing::put(update).delete(remove))
}

/// GET /api/data
async fn list(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<serde_json::Value>> {
    let notes = state.store.list_notes(user.id)?;
    Ok(Json(json!({ "success": true, "data": notes })))
}

#[derive(Deserialize)]
struct NoteBody {
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default = "default_category")]
    category: String,
}

fn default_category() -> String {
    "general".into()
}

/// POST /api/data
async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<NoteBody>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let body = json_body(body)?;
    if body.title.trim().is_empty() {
        return Err(ApiError::Validation("title is required".into()));
    }
    let note = state
        .store
        .insert_note(user.id, body.title.trim(), &body.content, &body.category)?;
    Ok(Json(json!({ "success": true, "data": note })))
}

/// PUT /api/data/{id}
async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    body: Result<Json<NoteBody>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let body = json_body(body)?;
    if body.title.trim().is_empty() {
        return Err(ApiError::Validation("title is required".into()));
    }
    let updated = state.store.update_note(
        id,
        user.id,
        body.title.trim(),
        &body.content,
        &body.category,
    )?;
    if !updated {
        return Err(ApiError::NotFound("Note"));
    }
    Ok(Json(json!({ "success": true, "message": "Note updated" })))
}

/// DELETE /api/data/{id}
async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    if !state.store.delete_note(id, user.id)? {
        return Err(ApiError::NotFound("Note"));
    }
    Ok(Json(json!({ "success": true, "message": "Note deleted" })))
}
