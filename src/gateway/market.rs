//! Market dashboard endpoints.
//!
//! Crypto quotes come from CoinGecko behind a short in-process cache; when
//! the upstream call fails the handler serves static fallback quotes instead
//! of an error. Forex quotes are simulated locally.

use super::AppState;
use crate::error::ApiResult;
use crate::gateway::authn::AuthUser;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::Mutex;
use rand::RngExt;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

const COINGECKO_URL: &str = "https://api.coingecko.com/api/v3/simple/price\
    ?ids=bitcoin,ethereum,ripple,cardano,solana\
    &vs_currencies=usd&include_24hr_change=true";

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(5);

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/crypto", get(crypto))
        .route("/forex", get(forex))
}

struct CachedPayload {
    fetched_at: Instant,
    payload: Value,
}

pub struct MarketCache {
    ttl: Duration,
    client: reqwest::Client,
    crypto: Mutex<Option<CachedPayload>>,
    forex: Mutex<Option<CachedPayload>>,
}

impl MarketCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            client: reqwest::Client::builder()
                .timeout(UPSTREAM_TIMEOUT)
                .build()
                .unwrap_or_default(),
            crypto: Mutex::new(None),
            forex: Mutex::new(None),
        }
    }

    fn fresh(&self, slot: &Mutex<Option<CachedPayload>>) -> Option<Value> {
        let guard = slot.lock();
        guard
            .as_ref()
            .filter(|cached| cached.fetched_at.elapsed() < self.ttl)
            .map(|cached| cached.payload.clone())
    }

    fn store(&self, slot: &Mutex<Option<CachedPayload>>, payload: Value) {
        *slot.lock() = Some(CachedPayload {
            fetched_at: Instant::now(),
            payload,
        });
    }

    /// Crypto quotes: cache, then upstream, then static fallback.
    pub async fn crypto_quotes(&self) -> Value {
        if let Some(cached) = self.fresh(&self.crypto) {
            return cached;
        }
        // The lock is never held across the fetch; concurrent misses just
        // fetch twice.
        let payload = match self.fetch_coingecko().await {
            Ok(data) => json!({ "data": data, "source": "live" }),
            Err(e) => {
                tracing::warn!("crypto quote fetch failed, serving fallback: {e}");
                json!({ "data": fallback_crypto(), "source": "fallback" })
            }
        };
        self.store(&self.crypto, payload.clone());
        payload
    }

    /// Forex quotes: simulated around fixed base rates, cached like crypto
    /// so the numbers hold still between refreshes.
    pub async fn forex_quotes(&self) -> Value {
        if let Some(cached) = self.fresh(&self.forex) {
            return cached;
        }
        let payload = json!({ "data": simulated_forex(), "source": "simulated" });
        self.store(&self.forex, payload.clone());
        payload
    }

    async fn fetch_coingecko(&self) -> Result<Value, reqwest::Error> {
        self.client
            .get(COINGECKO_URL)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await
    }
}

fn fallback_crypto() -> Value {
    json!({
        "bitcoin": { "usd": 43250.0, "usd_24h_change": 2.5 },
        "ethereum": { "usd": 2280.0, "usd_24h_change": 1.8 },
        "ripple": { "usd": 0.52, "usd_24h_change": -0.7 },
        "cardano": { "usd": 0.48, "usd_24h_change": 0.9 },
        "solana": { "usd": 98.5, "usd_24h_change": 3.2 },
    })
}

fn simulated_forex() -> Value {
    let mut rng = rand::rng();
    let mut jittered = |base: f64| base * (1.0 + rng.random_range(-0.005..0.005));
    json!({
        "USD/KRW": { "rate": jittered(1350.0) },
        "EUR/USD": { "rate": jittered(1.08) },
        "USD/JPY": { "rate": jittered(150.2) },
        "GBP/USD": { "rate": jittered(1.26) },
    })
}

/// GET /api/market/crypto
async fn crypto(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Json<Value>> {
    let quotes = state.market.crypto_quotes().await;
    Ok(Json(json!({ "success": true, "market": quotes })))
}

/// GET /api/market/forex
async fn forex(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Json<Value>> {
    let quotes = state.market.forex_quotes().await;
    Ok(Json(json!({ "success": true, "market": quotes })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_round_trip_and_expiry() {
        let cache = MarketCache::new(Duration::from_secs(60));
        assert!(cache.fresh(&cache.crypto).is_none());

        cache.store(&cache.crypto, json!({"x": 1}));
        assert_eq!(cache.fresh(&cache.crypto), Some(json!({"x": 1})));

        // Zero TTL: everything stored is already stale.
        let stale = MarketCache::new(Duration::from_secs(0));
        stale.store(&stale.crypto, json!({"x": 1}));
        assert!(stale.fresh(&stale.crypto).is_none());
    }

    #[test]
    fn fallback_covers_the_tracked_coins() {
        let data = fallback_crypto();
        for coin in ["bitcoin", "ethereum", "ripple", "cardano", "solana"] {
            assert!(data[coin]["usd"].is_number(), "missing {coin}");
        }
    }

    #[test]
    fn simulated_forex_stays_near_base_rates() {
        let data = simulated_forex();
        let krw = data["USD/KRW"]["rate"].as_f64().unwrap();
        assert!((1340.0..1360.0).contains(&krw));
    }

    #[tokio::test]
    async fn forex_quotes_are_cached() {
        let cache = MarketCache::new(Duration::from_secs(60));
        let first = cache.forex_quotes().await;
        let second = cache.forex_quotes().await;
        // Jitter would differ on a refetch; identical payloads mean a hit.
        assert_eq!(first, second);
    }
}
