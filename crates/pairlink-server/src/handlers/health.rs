//! Liveness and store connectivity checks.

use super::timestamp;
use crate::server::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use pairlink_core::{SessionConfig, StoreConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

/// How many session codes the store probe lists.
const PROBE_KEY_SAMPLE: usize = 10;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "OK",
        "store": state.store.backend_name(),
        "timestamp": timestamp(),
    }))
}

/// Round-trip a throwaway key through the store and count live sessions.
pub async fn store_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let backend = state.store.backend_name();
    match probe_store(&state).await {
        Ok(report) => (
            StatusCode::OK,
            Json(json!({
                "status": "OK",
                "store": report,
                "timestamp": timestamp(),
            })),
        ),
        Err(e) => {
            error!("Store health check failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "ERROR",
                    "store": {
                        "backend": backend,
                        "connected": false,
                        "error": e.public_message(),
                    },
                    "timestamp": timestamp(),
                })),
            )
        }
    }
}

async fn probe_store(state: &AppState) -> pairlink_core::Result<Value> {
    let store = &state.store;
    let key = StoreConfig::HEALTH_CHECK_KEY;

    store
        .set_with_expiry(key, "test", StoreConfig::HEALTH_CHECK_TTL)
        .await?;
    let value = store.get(key).await?;
    store.delete_many(&[key.to_string()]).await?;

    let mut keys = store.list_keys(SessionConfig::PAIR_PREFIX).await?;
    keys.sort();
    let active = keys.len();
    keys.truncate(PROBE_KEY_SAMPLE);

    Ok(json!({
        "backend": store.backend_name(),
        "connected": true,
        "test": if value.as_deref() == Some("test") { "PASS" } else { "FAIL" },
        "activeCodes": active,
        "keys": keys,
    }))
}
