//! Owner-scoped finance endpoints.

use super::{json_body, AppState};
use crate::error::{ApiError, ApiResult};
use crate::gateway::authn::AuthUser;
use crate::store::TxKind;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", axum::routing::put(update).delete(remove))
        .route("/summary", get(summary))
        .route("/charts", get(charts))
        .route("/monthly", get(monthly))
}

#[derive(Deserialize)]
struct ListQuery {
    /// Optional `YYYY-MM` month narrowing.
    month: Option<String>,
}

/// GET /api/finance, transactions plus running totals.
async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let transactions = state
        .store
        .list_transactions(user.id, query.month.as_deref())?;
    let summary = state.store.finance_summary(user.id)?;
    Ok(Json(json!({
        "success": true,
        "transactions": transactions,
        "summary": summary,
    })))
}

#[derive(Deserialize)]
struct TransactionBody {
    #[serde(alias = "type")]
    kind: TxKind,
    category: String,
    amount: f64,
    #[serde(default)]
    description: String,
    date: String,
}

impl TransactionBody {
    fn validate(&self) -> ApiResult<()> {
        if self.category.trim().is_empty() || self.date.trim().is_empty() {
            return Err(ApiError::Validation("category and date are required".into()));
        }
        if !(self.amount.is_finite() && self.amount > 0.0) {
            return Err(ApiError::Validation("amount must be a positive number".into()));
        }
        Ok(())
    }
}

/// POST /api/finance
async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<TransactionBody>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let body = json_body(body)?;
    body.validate()?;
    let tx = state.store.insert_transaction(
        user.id,
        body.kind,
        body.category.trim(),
        body.amount,
        &body.description,
        body.date.trim(),
    )?;
    Ok(Json(json!({ "success": true, "transaction": tx })))
}

/// PUT /api/finance/{id}
async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    body: Result<Json<TransactionBody>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let body = json_body(body)?;
    body.validate()?;
    let updated = state.store.update_transaction(
        id,
        user.id,
        body.kind,
        body.category.trim(),
        body.amount,
        &body.description,
        body.date.trim(),
    )?;
    if !updated {
        return Err(ApiError::NotFound("Transaction"));
    }
    Ok(Json(json!({ "success": true, "message": "Transaction updated" })))
}

/// DELETE /api/finance/{id}
async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    if !state.store.delete_transaction(id, user.id)? {
        return Err(ApiError::NotFound("Transaction"));
    }
    Ok(Json(json!({ "success": true, "message": "Transaction deleted" })))
}

/// GET /api/finance/summary, the totals alone.
async fn summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<serde_json::Value>> {
    let summary = state.store.finance_summary(user.id)?;
    Ok(Json(json!({ "success": true, "summary": summary })))
}

/// GET /api/finance/charts, expense breakdown plus a 7-day trend.
async fn charts(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<serde_json::Value>> {
    let by_category = state.store.expenses_by_category(user.id)?;
    let trend = state.store.weekly_trend(user.id)?;
    Ok(Json(json!({
        "success": true,
        "expensesByCategory": by_category,
        "weeklyTrend": trend,
    })))
}

/// GET /api/finance/monthly, income/expense totals per month.
async fn monthly(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<serde_json::Value>> {
    let months = state.store.monthly_totals(user.id)?;
    Ok(Json(json!({ "success": true, "months": months })))
}
