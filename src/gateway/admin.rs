//! Admin endpoints. Everything here requires the admin role; the extractor
//! rejects other callers with 403 before the handler runs.

use super::AppState;
use crate::error::{ApiError, ApiResult};
use crate::gateway::authn::AdminUser;
use crate::store::AccountInfo;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/user/{id}", axum::routing::delete(delete_user))
        .route("/user/{id}/data", get(user_data))
        .route("/logs", get(login_logs))
        .route("/stats", get(stats))
}

/// GET /api/admin/users
async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<serde_json::Value>> {
    let users = state.store.list_accounts()?;
    Ok(Json(json!({ "success": true, "users": users })))
}

/// GET /api/admin/user/{id}/data, a user's record plus everything they own.
async fn user_data(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    let account = state
        .store
        .account_by_id(id)?
        .ok_or(ApiError::NotFound("User"))?;
    let notes = state.store.list_notes(id)?;
    let transactions = state.store.list_transactions(id, None)?;
    Ok(Json(json!({
        "success": true,
        "user": AccountInfo::from(&account),
        "notes": notes,
        "transactions": transactions,
    })))
}

/// DELETE /api/admin/user/{id}. The cascade removes owned data. Admins cannot
/// delete themselves.
async fn delete_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    if id == admin.0.id {
        return Err(ApiError::SelfActionForbidden);
    }
    let target = state
        .store
        .account_by_id(id)?
        .ok_or(ApiError::NotFound("User"))?;
    if !state.store.delete_account(id)? {
        return Err(ApiError::NotFound("User"));
    }

    if let Err(e) = state.store.record_admin_action(
        admin.0.id,
        "delete_user",
        Some(id),
        &format!("username={}", target.username),
    ) {
        tracing::warn!(target = id, error = %e, "failed to record admin action");
    }
    Ok(Json(json!({ "success": true, "message": "User deleted" })))
}

/// GET /api/admin/logs, latest login events capped at 1000.
async fn login_logs(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<serde_json::Value>> {
    let logs = state.store.recent_login_logs(1000)?;
    Ok(Json(json!({ "success": true, "logs": logs })))
}

/// GET /api/admin/stats
async fn stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<serde_json::Value>> {
    Ok(Json(json!({
        "success": true,
        "stats": {
            "userCount": state.store.user_count()?,
            "noteCount": state.store.notes_count()?,
            "loginsToday": state.store.login_count_today()?,
            "registrationsToday": state.store.registration_count_today()?,
            "activeUsers7d": state.store.active_users_last_7_days()?,
        },
    })))
}
