//! Pairing endpoints: the REST fallback for clients without a socket.

use super::{get_str_field, require_body};
use crate::server::AppState;
use crate::ApiError;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use pairlink_core::{DesktopBinding, LinkDelivery};
use serde_json::{json, Value};
use std::sync::Arc;

/// Create a session with no live desktop. A desktop socket can adopt it later.
pub async fn generate_code(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let session = state
        .manager
        .obtain_desktop_session(DesktopBinding::Pending, None)
        .await
        .map_err(|e| ApiError::from_core(e, "Failed to generate code"))?;

    Ok(Json(json!({
        "success": true,
        "code": session.code,
        "message": "Code generated successfully",
    })))
}

/// Check a code without attaching a mobile to it.
pub async fn validate_code(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let body = require_body(payload)?;
    let code = get_str_field(&body, "code").unwrap_or_default();

    let status = state
        .manager
        .check_code(code)
        .await
        .map_err(|e| ApiError::from_core(e, "Failed to validate code"))?;

    Ok(Json(json!({
        "success": true,
        "code": status.code,
        "expiresInMinutes": status.expires_in_minutes,
        "message": "Code is valid",
    })))
}

pub async fn submit_link(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let body = require_body(payload)?;
    let code = get_str_field(&body, "code").unwrap_or_default();
    let link = get_str_field(&body, "link").unwrap_or_default();

    let delivery = state
        .manager
        .submit_link(code, link, None)
        .await
        .map_err(|e| ApiError::from_core(e, "Failed to submit link"))?;

    let note = match delivery {
        LinkDelivery::Delivered => "Link sent to desktop in real-time.",
        LinkDelivery::StoredOnly => {
            "Desktop not connected. Link is stored and will be available when desktop connects."
        }
    };

    Ok(Json(json!({
        "success": true,
        "delivered": delivery == LinkDelivery::Delivered,
        "message": "Link submitted successfully",
        "note": note,
    })))
}

pub async fn active_codes(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let sessions = state
        .manager
        .list_active_sessions()
        .await
        .map_err(|e| ApiError::from_core(e, "Failed to get active codes"))?;

    Ok(Json(json!({
        "success": true,
        "count": sessions.len(),
        "codes": sessions,
    })))
}
