use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::AppState;
use crate::models::*;
use crate::registry::{parse_project_id, RegistryError};

// ============================================================
// Error Handling
// ============================================================

/// Map a registry error to a response. Input problems are echoed back;
/// anything else is logged and hidden behind a generic message.
fn registry_error(e: RegistryError) -> (StatusCode, String) {
    match e {
        RegistryError::Invalid(msg) => {
            tracing::warn!("Validation error: {}", msg);
            (StatusCode::BAD_REQUEST, msg)
        }
        conflict @ RegistryError::CredentialInUse => (StatusCode::CONFLICT, conflict.to_string()),
        other => internal_error(other),
    }
}

fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> &'static str {
    "I'm okay!"
}

// ============================================================
// Registry
// ============================================================

pub async fn stats(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let count = state.registry.count().map_err(registry_error)?;
    Ok(Json(serde_json::json!({ "credentials": count })))
}

pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<Registration>), (StatusCode, String)> {
    state
        .registry
        .register(input)
        .map(|r| (StatusCode::CREATED, Json(r)))
        .map_err(registry_error)
}

pub async fn rekey_channel(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    Json(input): Json<RekeyInput>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state
        .registry
        .rekey_channel(&channel, &input.credential)
        .map_err(registry_error)?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((
            StatusCode::NOT_FOUND,
            "No credential registered for this channel".to_string(),
        ))
    }
}

pub async fn remove_channel(
    State(state): State<AppState>,
    Path(channel): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state
        .registry
        .remove_channel(&channel)
        .map_err(registry_error)?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((
            StatusCode::NOT_FOUND,
            "No credential registered for this channel".to_string(),
        ))
    }
}

/// Stop tracking a project and forget which of its devlogs were seen.
pub async fn remove_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    let project_id = parse_project_id(&id).map_err(registry_error)?;

    if !state
        .registry
        .remove_project(project_id)
        .map_err(registry_error)?
    {
        return Err((StatusCode::NOT_FOUND, "Project not tracked".to_string()));
    }
    state.store.remove(project_id).map_err(internal_error)?;
    Ok(StatusCode::NO_CONTENT)
}
