//! Event CRUD, the publish transition and invitation-link handling.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::auth::Identity;
use crate::models::{
    validate_and_normalize, validate_event_content, DateSlotInput, DiscountCodeInput, Event,
    EventDraft, EventLocation, FieldError, OrganizerContact, PublishStatus, RefundPolicy, Role,
    TicketTierInput, UserProfile, Visibility,
};
use crate::store::{EventStore, PurchaseStore};
use crate::utils::error::{AppError, AppResult};
use crate::utils::response::{created, empty_success, success};
use crate::utils::token::secure_token;
use crate::AppState;

use super::require_profile;

/// Partial update payload. Present sections replace the stored ones
/// wholesale; the merged result goes back through full validation.
#[derive(Debug, Default, Deserialize)]
pub struct EventPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub tags: Option<Vec<String>>,
    pub location: Option<EventLocation>,
    pub files: Option<Vec<String>>,
    pub is_multi_date: Option<bool>,
    pub date_slots: Option<Vec<DateSlotInput>>,
    pub ticket_tiers: Option<Vec<TicketTierInput>>,
    pub discount_codes: Option<Vec<DiscountCodeInput>>,
    pub refund_policy: Option<RefundPolicy>,
    pub refund_policy_note: Option<String>,
    pub visibility: Option<Visibility>,
    pub organizer_contact: Option<OrganizerContact>,
}

impl EventPatch {
    fn merge_into(self, draft: &mut EventDraft) {
        if self.name.is_some() {
            draft.name = self.name;
        }
        if self.description.is_some() {
            draft.description = self.description;
        }
        if self.genre.is_some() {
            draft.genre = self.genre;
        }
        if let Some(tags) = self.tags {
            draft.tags = tags;
        }
        if self.location.is_some() {
            draft.location = self.location;
        }
        if let Some(files) = self.files {
            draft.files = files;
        }
        if let Some(is_multi_date) = self.is_multi_date {
            draft.is_multi_date = is_multi_date;
        }
        if let Some(date_slots) = self.date_slots {
            draft.date_slots = date_slots;
        }
        if let Some(ticket_tiers) = self.ticket_tiers {
            draft.ticket_tiers = ticket_tiers;
        }
        if let Some(discount_codes) = self.discount_codes {
            draft.discount_codes = discount_codes;
        }
        if self.refund_policy.is_some() {
            draft.refund_policy = self.refund_policy;
        }
        if self.refund_policy_note.is_some() {
            draft.refund_policy_note = self.refund_policy_note;
        }
        if self.visibility.is_some() {
            draft.visibility = self.visibility;
        }
        if self.organizer_contact.is_some() {
            draft.organizer_contact = self.organizer_contact;
        }
    }
}

async fn require_seller(state: &AppState, identity: &Identity) -> AppResult<UserProfile> {
    let profile = require_profile(state, identity).await?;
    if !profile.can_create_events() {
        return Err(AppError::SellerUpgradeRequired);
    }
    Ok(profile)
}

/// Loads an event and checks the acting principal owns it. Admins pass.
async fn owned_event(state: &AppState, id: Uuid, profile: &UserProfile) -> AppResult<Event> {
    let event = state
        .events
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event '{id}' was not found")))?;
    if event.owner_id != profile.id && profile.role != Role::Admin {
        return Err(AppError::Forbidden(
            "Only the event owner can modify this event".to_string(),
        ));
    }
    Ok(event)
}

pub async fn create_event(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(draft): Json<EventDraft>,
) -> AppResult<Response> {
    let profile = require_seller(&state, &identity).await?;

    let normalized = validate_and_normalize(&draft).map_err(AppError::Validation)?;
    let event = normalized.into_event(profile.id);
    state.events.insert(&event).await?;

    info!(event_id = %event.id, owner = %profile.id, "Event created");
    Ok(created(event, "Event created").into_response())
}

pub async fn list_events(State(state): State<AppState>) -> AppResult<Response> {
    let events = state.events.list_public().await?;
    Ok(success(events, "Events fetched").into_response())
}

pub async fn list_my_events(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> AppResult<Response> {
    let profile = require_profile(&state, &identity).await?;
    let events = state.events.list_for_owner(profile.id).await?;
    Ok(success(events, "Events fetched").into_response())
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let event = state
        .events
        .get(id)
        .await?
        .filter(Event::is_published)
        .ok_or_else(|| AppError::NotFound(format!("Event '{id}' was not found")))?;
    Ok(success(event, "Event fetched").into_response())
}

pub async fn update_event(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(draft): Json<EventDraft>,
) -> AppResult<Response> {
    let profile = require_seller(&state, &identity).await?;
    let mut event = owned_event(&state, id, &profile).await?;

    let normalized = validate_and_normalize(&draft).map_err(AppError::Validation)?;
    normalized.apply_to(&mut event);
    if !state.events.update(&event).await? {
        return Err(AppError::NotFound(format!("Event '{id}' was not found")));
    }
    Ok(success(event, "Event updated").into_response())
}

pub async fn patch_event(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(patch): Json<EventPatch>,
) -> AppResult<Response> {
    let profile = require_seller(&state, &identity).await?;
    let mut event = owned_event(&state, id, &profile).await?;

    let mut draft = EventDraft::from(&event);
    patch.merge_into(&mut draft);
    let normalized = validate_and_normalize(&draft).map_err(AppError::Validation)?;
    normalized.apply_to(&mut event);
    if !state.events.update(&event).await? {
        return Err(AppError::NotFound(format!("Event '{id}' was not found")));
    }
    Ok(success(event, "Event updated").into_response())
}

pub async fn delete_event(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let profile = require_seller(&state, &identity).await?;
    owned_event(&state, id, &profile).await?;

    // Sales records reference the event; deleting would orphan them, so
    // the event stays once the first ticket is sold.
    if !state.purchases.list_for_event(id).await?.is_empty() {
        return Err(AppError::Validation(vec![FieldError::new(
            "event_id",
            "Events with ticket sales cannot be deleted",
        )]));
    }

    if !state.events.delete(id).await? {
        return Err(AppError::NotFound(format!("Event '{id}' was not found")));
    }
    info!(event_id = %id, "Event deleted");
    Ok(empty_success("Event deleted").into_response())
}

/// One-way draft-to-published transition. The full required-field set is
/// re-checked so a draft that degraded through partial updates cannot go
/// live. Publishing an already-published event succeeds without changes.
pub async fn publish_event(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let profile = require_seller(&state, &identity).await?;
    let mut event = owned_event(&state, id, &profile).await?;

    if event.is_published() {
        return Ok(success(event, "Event is already published").into_response());
    }

    let errors = validate_event_content(&event);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    // A private event must have a working invitation link by the time it
    // is live.
    if event.settings.visibility == Visibility::Private
        && event.settings.invitation_token.is_none()
    {
        event.settings.invitation_token = Some(secure_token());
    }
    event.settings.publish_status = PublishStatus::Published;
    event.updated_at = chrono::Utc::now();

    if !state.events.update(&event).await? {
        return Err(AppError::NotFound(format!("Event '{id}' was not found")));
    }
    info!(event_id = %id, "Event published");
    Ok(success(event, "Event published").into_response())
}

pub async fn regenerate_invitation(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let profile = require_seller(&state, &identity).await?;
    let mut event = owned_event(&state, id, &profile).await?;

    if event.settings.visibility != Visibility::Private {
        return Err(AppError::Validation(vec![FieldError::new(
            "visibility",
            "Only private events carry invitation links",
        )]));
    }

    // Replacing the stored token is what invalidates the old link; lookups
    // go through the store, so the swap takes effect immediately.
    let token = secure_token();
    event.settings.invitation_token = Some(token.clone());
    event.updated_at = chrono::Utc::now();
    if !state.events.update(&event).await? {
        return Err(AppError::NotFound(format!("Event '{id}' was not found")));
    }

    info!(event_id = %id, "Invitation token regenerated");
    Ok(success(json!({ "invitation_token": token }), "Invitation link regenerated").into_response())
}

pub async fn resolve_invitation(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Response> {
    let event = state
        .events
        .find_by_invitation_token(&token)
        .await?
        .filter(|e| e.settings.visibility == Visibility::Private && e.is_published())
        .ok_or_else(|| AppError::NotFound("Invalid or expired invitation".to_string()))?;
    Ok(success(event, "Event fetched").into_response())
}
