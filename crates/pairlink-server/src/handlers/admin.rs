//! Operator endpoints.

use super::get_str_field;
use crate::server::AppState;
use crate::ApiError;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use pairlink_core::PairlinkError;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

pub async fn dashboard(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let sessions = state
        .manager
        .list_active_sessions()
        .await
        .map_err(|e| ApiError::from_core(e, "Failed to get dashboard data"))?;
    let counts = state.manager.registry().counts().await;

    Ok(Json(json!({
        "success": true,
        "data": {
            "activeCodesCount": sessions.len(),
            "activeCodes": sessions,
            "connections": {
                "desktops": counts.desktops,
                "mobiles": counts.mobiles,
                "sockets": state.relay.connection_count().await,
            },
        },
    })))
}

/// Delete every session. Requires `{"pass": "<admin password>"}`.
pub async fn reset_codes(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let body = payload.map(|Json(body)| body).unwrap_or(Value::Null);
    if get_str_field(&body, "pass") != Some(state.admin_pass.as_str()) {
        warn!("Rejected reset-codes with invalid admin password");
        return Err(ApiError::from(PairlinkError::Unauthorized));
    }

    let deleted = state
        .manager
        .reset_all()
        .await
        .map_err(|e| ApiError::from_core(e, "Failed to reset codes"))?;
    info!("Admin reset deleted {} entries", deleted);

    Ok(Json(json!({
        "success": true,
        "message": format!("Reset successful. Deleted {} entries.", deleted),
        "deletedCount": deleted,
    })))
}
