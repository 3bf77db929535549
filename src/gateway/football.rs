//! Football endpoints: reads for every authenticated user, writes for admins.

use super::{json_body, AppState};
use crate::error::{ApiError, ApiResult};
use crate::gateway::authn::{AdminUser, AuthUser};
use crate::store::compute_standings;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/matches", get(list_matches).post(create_match))
        .route(
            "/matches/{id}",
            get(match_detail).put(update_score).delete(remove_match),
        )
        .route("/standings", get(standings))
        .route("/live", get(live_matches))
}

#[derive(Deserialize)]
struct MatchFilter {
    league: Option<String>,
    status: Option<String>,
}

/// GET /api/football/matches
async fn list_matches(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(filter): Query<MatchFilter>,
) -> ApiResult<Json<serde_json::Value>> {
    let matches = state
        .store
        .list_matches(filter.league.as_deref(), filter.status.as_deref())?;
    let leagues = state.store.leagues()?;
    Ok(Json(json!({ "success": true, "matches": matches, "leagues": leagues })))
}

/// GET /api/football/matches/{id}
async fn match_detail(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    let m = state.store.match_by_id(id)?.ok_or(ApiError::NotFound("Match"))?;
    Ok(Json(json!({ "success": true, "match": m })))
}

#[derive(Deserialize)]
struct StandingsQuery {
    league: Option<String>,
}

/// GET /api/football/standings?league=
async fn standings(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<StandingsQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let league = query
        .league
        .as_deref()
        .filter(|l| !l.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("league query parameter is required".into()))?;
    let table = compute_standings(&state.store.finished_matches(league)?);
    Ok(Json(json!({ "success": true, "league": league, "standings": table })))
}

/// GET /api/football/live
async fn live_matches(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ApiResult<Json<serde_json::Value>> {
    let matches = state.store.list_matches(None, Some("live"))?;
    Ok(Json(json!({ "success": true, "matches": matches })))
}

#[derive(Deserialize)]
struct CreateMatchBody {
    league_name: String,
    home_team: String,
    away_team: String,
    match_date: String,
    match_time: Option<String>,
    #[serde(default = "default_status")]
    status: String,
}

fn default_status() -> String {
    "scheduled".into()
}

const MATCH_STATUSES: [&str; 3] = ["scheduled", "live", "finished"];

fn validate_status(status: &str) -> ApiResult<()> {
    if MATCH_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(ApiError::Validation(
            "status must be one of scheduled, live, finished".into(),
        ))
    }
}

/// POST /api/football/matches (admin)
async fn create_match(
    State(state): State<AppState>,
    admin: AdminUser,
    body: Result<Json<CreateMatchBody>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let body = json_body(body)?;
    if body.league_name.trim().is_empty()
        || body.home_team.trim().is_empty()
        || body.away_team.trim().is_empty()
        || body.match_date.trim().is_empty()
    {
        return Err(ApiError::Validation(
            "league_name, home_team, away_team and match_date are required".into(),
        ));
    }
    validate_status(&body.status)?;

    let m = state.store.insert_match(
        body.league_name.trim(),
        body.home_team.trim(),
        body.away_team.trim(),
        body.match_date.trim(),
        body.match_time.as_deref(),
        &body.status,
        admin.0.id,
    )?;
    log_admin(&state, admin.0.id, "create_match", &format!("match {}", m.id));
    Ok(Json(json!({ "success": true, "match": m })))
}

#[derive(Deserialize)]
struct ScoreBody {
    home_score: i64,
    away_score: i64,
    status: String,
}

/// PUT /api/football/matches/{id} (admin)
async fn update_score(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    body: Result<Json<ScoreBody>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let body = json_body(body)?;
    if body.home_score < 0 || body.away_score < 0 {
        return Err(ApiError::Validation("scores must not be negative".into()));
    }
    validate_status(&body.status)?;

    if !state
        .store
        .update_match_score(id, body.home_score, body.away_score, &body.status)?
    {
        return Err(ApiError::NotFound("Match"));
    }
    log_admin(&state, admin.0.id, "update_match", &format!("match {id}"));
    Ok(Json(json!({ "success": true, "message": "Match updated" })))
}

/// DELETE /api/football/matches/{id} (admin)
async fn remove_match(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    if !state.store.delete_match(id)? {
        return Err(ApiError::NotFound("Match"));
    }
    log_admin(&state, admin.0.id, "delete_match", &format!("match {id}"));
    Ok(Json(json!({ "success": true, "message": "Match deleted" })))
}

fn log_admin(state: &AppState, admin_id: i64, action: &str, details: &str) {
    if let Err(e) = state.store.record_admin_action(admin_id, action, None, details) {
        tracing::warn!(action, error = %e, "failed to record admin action");
    }
}
