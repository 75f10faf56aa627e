//! Profile upsert, fetch/update and the seller upgrade path.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use tracing::info;

use crate::auth::Identity;
use crate::models::{Role, SellerInfo};
use crate::store::{NewProfile, ProfileStore, ProfileUpdate};
use crate::utils::error::{AppError, AppResult};
use crate::utils::response::{created, success};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UpsertUserRequest {
    pub role: Option<Role>,
    pub display_name: Option<String>,
    pub profile_picture: Option<String>,
    pub seller_info: Option<SellerInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub profile_picture: Option<String>,
    pub seller_info: Option<SellerInfo>,
}

fn require_own_uid(identity: &Identity, uid: &str) -> AppResult<()> {
    if identity.uid != uid {
        return Err(AppError::Forbidden(
            "You can only access your own profile".to_string(),
        ));
    }
    Ok(())
}

/// Get-or-create keyed by the verified identity. Runs under the
/// per-identity lock, so a sign-in auto-create racing a seller signup for
/// the same identity resolves to a single profile.
pub async fn upsert_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<UpsertUserRequest>,
) -> AppResult<Response> {
    let requested_role = payload.role.unwrap_or_default();
    if requested_role == Role::Admin {
        return Err(AppError::Forbidden(
            "Admin role cannot be self-assigned".to_string(),
        ));
    }

    let lock = state.signups.lock_for(&identity.uid);
    let _guard = lock.lock().await;

    match state.profiles.find_by_uid(&identity.uid).await? {
        Some(existing) => {
            // An existing user asking for seller is an upgrade, not a
            // duplicate signup.
            let profile = if requested_role == Role::Seller && existing.role == Role::User {
                state
                    .profiles
                    .upgrade_to_seller(&identity.uid, payload.seller_info.unwrap_or_default())
                    .await?
                    .ok_or_else(|| {
                        AppError::Internal("Profile disappeared during upgrade".to_string())
                    })?
            } else {
                state
                    .profiles
                    .update(
                        &identity.uid,
                        ProfileUpdate {
                            email: Some(identity.email.clone()),
                            display_name: payload.display_name,
                            profile_picture: payload.profile_picture,
                            seller_info: payload.seller_info,
                        },
                    )
                    .await?
                    .ok_or_else(|| {
                        AppError::Internal("Profile disappeared during update".to_string())
                    })?
            };
            state.profiles.touch_login(&identity.uid).await?;
            Ok(success(profile, "Profile updated").into_response())
        }
        None => {
            let profile = state
                .profiles
                .create(NewProfile {
                    firebase_uid: identity.uid.clone(),
                    email: identity.email.clone(),
                    display_name: payload.display_name.or(identity.display_name.clone()),
                    role: requested_role,
                    profile_picture: payload.profile_picture,
                    seller_info: if requested_role == Role::Seller {
                        Some(payload.seller_info.unwrap_or_default())
                    } else {
                        None
                    },
                })
                .await?;
            info!(uid = %identity.uid, role = profile.role.as_str(), "Profile created");
            Ok(created(profile, "Profile created").into_response())
        }
    }
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(uid): Path<String>,
) -> AppResult<Response> {
    require_own_uid(&identity, &uid)?;
    let profile = state
        .profiles
        .find_by_uid(&uid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No profile for identity '{uid}'")))?;
    Ok(success(profile, "Profile fetched").into_response())
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(uid): Path<String>,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Response> {
    require_own_uid(&identity, &uid)?;
    let profile = state
        .profiles
        .update(
            &uid,
            ProfileUpdate {
                email: None,
                display_name: payload.display_name,
                profile_picture: payload.profile_picture,
                seller_info: payload.seller_info,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No profile for identity '{uid}'")))?;
    Ok(success(profile, "Profile updated").into_response())
}

pub async fn upgrade_to_seller(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(uid): Path<String>,
    Json(info): Json<SellerInfo>,
) -> AppResult<Response> {
    require_own_uid(&identity, &uid)?;

    let lock = state.signups.lock_for(&uid);
    let _guard = lock.lock().await;

    let profile = state
        .profiles
        .upgrade_to_seller(&uid, info)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No profile for identity '{uid}'")))?;
    info!(uid = %uid, "Profile upgraded to seller");
    Ok(success(profile, "Profile upgraded to seller").into_response())
}
