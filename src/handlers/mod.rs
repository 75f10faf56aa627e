use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::auth::Identity;
use crate::models::UserProfile;
use crate::store::ProfileStore;
use crate::utils::error::{AppError, AppResult};
use crate::utils::response::success;
use crate::AppState;

pub mod events;
pub mod profiles;
pub mod purchases;
pub mod uploads;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "stagepass-api",
    };

    success(payload, "Health check successful").into_response()
}

/// The profile matching the verified identity. Authenticated endpoints
/// that act on behalf of a user need this; an identity whose profile has
/// not been created yet is treated as unauthenticated.
pub(crate) async fn require_profile(
    state: &AppState,
    identity: &Identity,
) -> AppResult<UserProfile> {
    state
        .profiles
        .find_by_uid(&identity.uid)
        .await?
        .ok_or_else(|| AppError::Auth("No profile exists for this identity".to_string()))
}
