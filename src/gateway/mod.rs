//! HTTP gateway: router assembly, auth endpoints, rate limiting.

pub mod admin;
pub mod authn;
pub mod finance;
pub mod football;
pub mod market;
pub mod notes;

use crate::auth::password::Hasher;
use crate::auth::{token, AuthService, RequestMeta, TokenCodec};
use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::store::Store;
use authn::{AuthUser, TOKEN_COOKIE};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// How often the rate limiter sweeps stale client entries from its map.
const RATE_LIMITER_SWEEP_INTERVAL_SECS: u64 = 300; // 5 minutes

#[derive(Debug)]
pub struct SlidingWindowRateLimiter {
    limit_per_window: u32,
    window: Duration,
    requests: Mutex<(HashMap<String, Vec<Instant>>, Instant)>,
}

impl SlidingWindowRateLimiter {
    pub fn new(limit_per_window: u32, window: Duration) -> Self {
        Self {
            limit_per_window,
            window,
            requests: Mutex::new((HashMap::new(), Instant::now())),
        }
    }

    pub fn allow(&self, key: &str) -> bool {
        if self.limit_per_window == 0 {
            return true;
        }

        let now = Instant::now();
        let cutoff = now.checked_sub(self.window).unwrap_or_else(Instant::now);

        let mut guard = self.requests.lock();
        let (requests, last_sweep) = &mut *guard;

        // Periodic sweep: remove clients with no recent requests
        if last_sweep.elapsed() >= Duration::from_secs(RATE_LIMITER_SWEEP_INTERVAL_SECS) {
            requests.retain(|_, timestamps| {
                timestamps.retain(|t| *t > cutoff);
                !timestamps.is_empty()
            });
            *last_sweep = now;
        }

        let entry = requests.entry(key.to_owned()).or_default();
        entry.retain(|instant| *instant > cutoff);

        if entry.len() >= self.limit_per_window as usize {
            return false;
        }

        entry.push(now);
        true
    }

    fn window_secs(&self) -> u64 {
        self.window.as_secs()
    }
}

/// Best-effort client identity for rate limiting and audit logs. Proxy
/// headers first, then a fixed fallback.
fn client_key_from_headers(headers: &HeaderMap) -> String {
    for header_name in ["X-Forwarded-For", "X-Real-IP"] {
        if let Some(value) = headers.get(header_name).and_then(|v| v.to_str().ok()) {
            let first = value.split(',').next().unwrap_or("").trim();
            if !first.is_empty() {
                return first.to_owned();
            }
        }
    }
    "unknown".into()
}

fn request_meta(headers: &HeaderMap) -> RequestMeta {
    RequestMeta {
        ip: client_key_from_headers(headers),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_owned(),
    }
}

/// Unwrap an axum JSON body, folding deserialization failures into the
/// validation error.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(ApiError::Validation(format!(
            "invalid request body: {rejection}"
        ))),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub store: Arc<Store>,
    pub auth_limiter: Arc<SlidingWindowRateLimiter>,
    pub market: Arc<market::MarketCache>,
}

/// Build the full application from configuration: open the store, resolve
/// the signing secret, seed the admin account, assemble the router.
pub fn app(config: &Config) -> anyhow::Result<Router> {
    let store = Arc::new(Store::open(&config.database.path)?);

    let secret = match config.auth.jwt_secret.clone() {
        Some(secret) => secret,
        None => {
            tracing::warn!(
                "no signing secret configured; using an ephemeral one, \
                 issued tokens will not survive a restart"
            );
            token::generate_secret()
        }
    };

    let auth = Arc::new(AuthService::new(
        Arc::clone(&store),
        TokenCodec::new(secret.as_bytes()),
        Hasher::new(config.auth.pbkdf2_rounds),
        config.token_ttl_secs(),
        config.auth.min_password_len,
    )?);

    if let Some(password) = &config.auth.admin_password {
        if auth.ensure_admin(&config.auth.admin_username, &config.auth.admin_email, password)? {
            tracing::info!(username = %config.auth.admin_username, "seeded admin account");
        }
    }

    let state = AppState {
        auth,
        store,
        auth_limiter: Arc::new(SlidingWindowRateLimiter::new(
            config.gateway.auth_attempts_per_window,
            Duration::from_secs(config.gateway.auth_window_secs),
        )),
        market: Arc::new(market::MarketCache::new(Duration::from_secs(60))),
    };

    Ok(build_router(state, config))
}

fn build_router(state: AppState, config: &Config) -> Router {
    // Credential endpoints sit behind the attempt limiter; the rest of the
    // auth group does not.
    let credential_routes = Router::new()
        .route("/register", post(handle_register))
        .route("/login", post(handle_login))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_rate_limit,
        ));

    let auth_routes = credential_routes
        .route("/logout", post(handle_logout))
        .route("/me", get(handle_me));

    Router::new()
        .route("/health", get(handle_health))
        .nest("/api/auth", auth_routes)
        .nest("/api/data", notes::router())
        .nest("/api/finance", finance::router())
        .nest("/api/football", football::router())
        .nest("/api/admin", admin::router())
        .nest("/api/market", market::router())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.gateway.request_timeout_secs,
        )))
        .layer(RequestBodyLimitLayer::new(config.gateway.max_body_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the gateway until ctrl-c.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let router = app(&config)?;
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("gateway listening on http://{addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install ctrl-c handler: {e}");
        return;
    }
    tracing::info!("shutdown signal received");
}

async fn auth_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let client_key = client_key_from_headers(request.headers());
    if !state.auth_limiter.allow(&client_key) {
        tracing::warn!("auth rate limit exceeded for key: {client_key}");
        let err = json!({
            "error": "Too many authentication attempts. Please retry later.",
            "retry_after": state.auth_limiter.window_secs(),
        });
        return (StatusCode::TOO_MANY_REQUESTS, Json(err)).into_response();
    }
    next.run(request).await
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Deserialize)]
struct RegisterBody {
    username: String,
    email: String,
    password: String,
}

/// POST /api/auth/register
async fn handle_register(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    body: Result<Json<RegisterBody>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let body = json_body(body)?;
    let meta = request_meta(&headers);
    let session = state
        .auth
        .register(&body.username, &body.email, &body.password, &meta)?;

    let jar = jar.add(session_cookie(session.token));
    Ok((
        jar,
        Json(json!({
            "success": true,
            "message": "Registration successful",
            "user": session.user,
        })),
    ))
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

/// POST /api/auth/login. `username` accepts the email as well.
async fn handle_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let body = json_body(body)?;
    let meta = request_meta(&headers);
    let session = state.auth.login(&body.username, &body.password, &meta)?;

    let jar = jar.add(session_cookie(session.token.clone()));
    Ok((
        jar,
        Json(json!({
            "success": true,
            "message": "Login successful",
            "user": session.user,
            "token": session.token,
        })),
    ))
}

/// POST /api/auth/logout clears the cookie. Bearer clients just drop the
/// token; there is nothing to revoke server-side.
async fn handle_logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build((TOKEN_COOKIE, "")).path("/").build());
    (
        jar,
        Json(json!({ "success": true, "message": "Logged out" })),
    )
}

/// GET /api/auth/me, the fresh account record for the verified subject.
async fn handle_me(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<serde_json::Value>> {
    let account = state.auth.current_user(user.id)?;
    Ok(Json(json!({ "success": true, "user": account })))
}
