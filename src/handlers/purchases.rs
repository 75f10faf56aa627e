//! Ticket purchase creation. Checkout is a stub: the record is written
//! with a confirmed status and generated entry codes, but no payment flow
//! runs.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::Identity;
use crate::models::{
    FieldError, PaymentMethod, PurchaseStatus, Role, TicketCode, TicketPurchase, TierKind,
};
use crate::store::{EventStore, PurchaseStore};
use crate::utils::error::{AppError, AppResult};
use crate::utils::response::{created, success};
use crate::utils::token::ticket_code;
use crate::AppState;

use super::require_profile;

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub tier_name: String,
    pub quantity: i32,
    pub payment_method: Option<PaymentMethod>,
    pub transaction_id: Option<String>,
}

pub async fn create_purchase(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(event_id): Path<Uuid>,
    Json(payload): Json<PurchaseRequest>,
) -> AppResult<Response> {
    let profile = require_profile(&state, &identity).await?;

    let event = state
        .events
        .get(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event '{event_id}' was not found")))?;

    let mut errors = Vec::new();
    if !event.is_published() {
        errors.push(FieldError::new(
            "event_id",
            "Tickets can only be purchased for published events",
        ));
    }

    let tier = match event.tier(&payload.tier_name) {
        Some(tier) => tier,
        None => {
            errors.push(FieldError::new(
                "tier_name",
                format!("No ticket tier named '{}' exists", payload.tier_name),
            ));
            return Err(AppError::Validation(errors));
        }
    };
    if !tier.active {
        errors.push(FieldError::new(
            "tier_name",
            "This ticket tier is not on sale",
        ));
    }
    if payload.quantity < 1 {
        errors.push(FieldError::new("quantity", "Quantity must be at least 1"));
    } else if payload.quantity > tier.quantity {
        errors.push(FieldError::new(
            "quantity",
            format!("Only {} tickets are available in this tier", tier.quantity),
        ));
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let payment_method = match tier.kind {
        TierKind::Free => PaymentMethod::Free,
        _ => payload.payment_method.ok_or_else(|| {
            AppError::Validation(vec![FieldError::new(
                "payment_method",
                "A payment method is required for paid tiers",
            )])
        })?,
    };

    // One entry code per ticket unit; the total is always derived, never
    // taken from the request.
    let quantity = payload.quantity;
    let total_amount = tier.price * Decimal::from(quantity);
    let codes: Vec<TicketCode> = (0..quantity)
        .map(|_| TicketCode {
            code: ticket_code(),
            used: false,
            used_at: None,
        })
        .collect();

    let purchase = TicketPurchase {
        id: Uuid::new_v4(),
        event_id,
        buyer_uid: identity.uid.clone(),
        buyer_profile_id: profile.id,
        tier_name: tier.name.clone(),
        tier_kind: tier.kind,
        quantity,
        price_per_ticket: tier.price,
        total_amount,
        status: PurchaseStatus::Confirmed,
        payment_method,
        transaction_id: payload.transaction_id,
        ticket_codes: codes,
        created_at: Utc::now(),
    };
    state.purchases.insert(&purchase).await?;

    info!(purchase_id = %purchase.id, event_id = %event_id, quantity, "Tickets purchased");
    Ok(created(purchase, "Tickets purchased").into_response())
}

/// Owner-facing sales list for one event.
pub async fn list_event_purchases(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(event_id): Path<Uuid>,
) -> AppResult<Response> {
    let profile = require_profile(&state, &identity).await?;
    let event = state
        .events
        .get(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event '{event_id}' was not found")))?;
    if event.owner_id != profile.id && profile.role != Role::Admin {
        return Err(AppError::Forbidden(
            "Only the event owner can view its sales".to_string(),
        ));
    }

    let purchases = state.purchases.list_for_event(event_id).await?;
    Ok(success(purchases, "Purchases fetched").into_response())
}
