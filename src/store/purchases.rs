use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::PurchaseStore;
use crate::models::{PaymentMethod, PurchaseStatus, TicketCode, TicketPurchase, TierKind};
use crate::utils::error::{AppError, AppResult};

pub struct PgPurchaseStore {
    pool: PgPool,
}

impl PgPurchaseStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct PurchaseRow {
    id: Uuid,
    event_id: Uuid,
    buyer_uid: String,
    buyer_profile_id: Uuid,
    tier_name: String,
    tier_kind: String,
    quantity: i32,
    price_per_ticket: Decimal,
    total_amount: Decimal,
    status: String,
    payment_method: String,
    transaction_id: Option<String>,
    ticket_codes: Json<Vec<TicketCode>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PurchaseRow> for TicketPurchase {
    type Error = AppError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        let tier_kind: TierKind = row
            .tier_kind
            .parse()
            .map_err(|e: String| AppError::Internal(e))?;
        let status: PurchaseStatus = row
            .status
            .parse()
            .map_err(|e: String| AppError::Internal(e))?;
        let payment_method: PaymentMethod = row
            .payment_method
            .parse()
            .map_err(|e: String| AppError::Internal(e))?;
        Ok(TicketPurchase {
            id: row.id,
            event_id: row.event_id,
            buyer_uid: row.buyer_uid,
            buyer_profile_id: row.buyer_profile_id,
            tier_name: row.tier_name,
            tier_kind,
            quantity: row.quantity,
            price_per_ticket: row.price_per_ticket,
            total_amount: row.total_amount,
            status,
            payment_method,
            transaction_id: row.transaction_id,
            ticket_codes: row.ticket_codes.0,
            created_at: row.created_at,
        })
    }
}

const SELECT_PURCHASE: &str = "SELECT id, event_id, buyer_uid, buyer_profile_id, tier_name, \
     tier_kind, quantity, price_per_ticket, total_amount, status, payment_method, \
     transaction_id, ticket_codes, created_at FROM ticket_purchases";

#[async_trait]
impl PurchaseStore for PgPurchaseStore {
    async fn insert(&self, purchase: &TicketPurchase) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO ticket_purchases (id, event_id, buyer_uid, buyer_profile_id, \
             tier_name, tier_kind, quantity, price_per_ticket, total_amount, status, \
             payment_method, transaction_id, ticket_codes, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(purchase.id)
        .bind(purchase.event_id)
        .bind(&purchase.buyer_uid)
        .bind(purchase.buyer_profile_id)
        .bind(&purchase.tier_name)
        .bind(purchase.tier_kind.as_str())
        .bind(purchase.quantity)
        .bind(purchase.price_per_ticket)
        .bind(purchase.total_amount)
        .bind(purchase.status.as_str())
        .bind(purchase.payment_method.as_str())
        .bind(&purchase.transaction_id)
        .bind(Json(&purchase.ticket_codes))
        .bind(purchase.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<TicketPurchase>> {
        let row = sqlx::query_as::<_, PurchaseRow>(&format!("{SELECT_PURCHASE} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TicketPurchase::try_from).transpose()
    }

    async fn list_for_event(&self, event_id: Uuid) -> AppResult<Vec<TicketPurchase>> {
        let rows = sqlx::query_as::<_, PurchaseRow>(&format!(
            "{SELECT_PURCHASE} WHERE event_id = $1 ORDER BY created_at DESC"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TicketPurchase::try_from).collect()
    }
}
