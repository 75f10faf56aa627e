use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::event::TierKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Pending,
    Confirmed,
    Cancelled,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    Paypal,
    Stripe,
    Free,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Confirmed => "confirmed",
            PurchaseStatus::Cancelled => "cancelled",
            PurchaseStatus::Refunded => "refunded",
        }
    }
}

impl std::str::FromStr for PurchaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PurchaseStatus::Pending),
            "confirmed" => Ok(PurchaseStatus::Confirmed),
            "cancelled" => Ok(PurchaseStatus::Cancelled),
            "refunded" => Ok(PurchaseStatus::Refunded),
            other => Err(format!("unknown purchase status '{other}'")),
        }
    }
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::Stripe => "stripe",
            PaymentMethod::Free => "free",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit_card" => Ok(PaymentMethod::CreditCard),
            "paypal" => Ok(PaymentMethod::Paypal),
            "stripe" => Ok(PaymentMethod::Stripe),
            "free" => Ok(PaymentMethod::Free),
            other => Err(format!("unknown payment method '{other}'")),
        }
    }
}

/// One entry per ticket unit. Entry validation is out of scope; only the
/// `used` flip is modeled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketCode {
    pub code: String,
    pub used: bool,
    #[serde(default)]
    pub used_at: Option<DateTime<Utc>>,
}

/// Record of a buyer committing a tier selection against a published
/// event. Immutable after creation except for status transitions and
/// ticket-code `used` flips. Checkout itself is stubbed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketPurchase {
    pub id: Uuid,
    pub event_id: Uuid,
    pub buyer_uid: String,
    pub buyer_profile_id: Uuid,
    pub tier_name: String,
    pub tier_kind: TierKind,
    pub quantity: i32,
    pub price_per_ticket: Decimal,
    /// Always quantity x price_per_ticket, computed server-side.
    pub total_amount: Decimal,
    pub status: PurchaseStatus,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub ticket_codes: Vec<TicketCode>,
    pub created_at: DateTime<Utc>,
}
