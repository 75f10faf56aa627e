use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Physical,
    Online,
    Hybrid,
}

impl EventType {
    /// Physical and hybrid events need a full venue address.
    pub fn requires_venue(&self) -> bool {
        matches!(self, EventType::Physical | EventType::Hybrid)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLocation {
    pub event_type: EventType,
    #[serde(default)]
    pub venue_name: Option<String>,
    #[serde(default)]
    pub street_address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// A normalized schedule slot. The raw four-field form lives in
/// [`DateSlotInput`] and is converted during validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateSlot {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSchedule {
    pub is_multi_date: bool,
    pub slots: Vec<DateSlot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierKind {
    #[default]
    Free,
    Paid,
    Donation,
}

impl TierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TierKind::Free => "free",
            TierKind::Paid => "paid",
            TierKind::Donation => "donation",
        }
    }
}

impl std::str::FromStr for TierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(TierKind::Free),
            "paid" => Ok(TierKind::Paid),
            "donation" => Ok(TierKind::Donation),
            other => Err(format!("unknown tier kind '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketTier {
    pub name: String,
    pub kind: TierKind,
    pub price: Decimal,
    pub quantity: i32,
    #[serde(default)]
    pub description: Option<String>,
    pub active: bool,
    pub public: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountCode {
    pub code: String,
    /// Tier names this code applies to, checked against the tiers present
    /// in the same draft at save time.
    pub applicable_tiers: Vec<String>,
    /// 0 means unlimited.
    pub max_uses: i32,
    pub discount_amount: Decimal,
    pub discount_type: DiscountType,
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefundPolicy {
    #[serde(rename = "1_day")]
    OneDay,
    #[serde(rename = "2_days")]
    TwoDays,
    #[serde(rename = "14_days")]
    FourteenDays,
    #[serde(rename = "30_days")]
    ThirtyDays,
    #[serde(rename = "no_refund")]
    NoRefund,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    Draft,
    Published,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSettings {
    pub refund_policy: RefundPolicy,
    #[serde(default)]
    pub refund_policy_note: Option<String>,
    pub visibility: Visibility,
    /// Present only for private events. Regenerating it invalidates the
    /// previous invitation link immediately.
    #[serde(default)]
    pub invitation_token: Option<String>,
    pub publish_status: PublishStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizerContact {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub x: Option<String>,
    #[serde(default)]
    pub facebook: Option<String>,
}

/// The complete event aggregate as stored and served.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub genre: String,
    pub tags: Vec<String>,
    pub location: EventLocation,
    /// Ordered media URLs; the first one is the banner.
    pub files: Vec<String>,
    pub schedule: EventSchedule,
    pub ticket_tiers: Vec<TicketTier>,
    pub discount_codes: Vec<DiscountCode>,
    pub settings: EventSettings,
    pub organizer_contact: OrganizerContact,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn is_published(&self) -> bool {
        self.settings.publish_status == PublishStatus::Published
    }

    pub fn tier(&self, name: &str) -> Option<&TicketTier> {
        self.ticket_tiers.iter().find(|t| t.name == name)
    }
}

/// Raw schedule slot input: local date and time pairs, converted to
/// absolute timestamps during validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateSlotInput {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

impl DateSlotInput {
    pub fn is_complete(&self) -> bool {
        let filled = |f: &Option<String>| f.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.start_date)
            && filled(&self.start_time)
            && filled(&self.end_date)
            && filled(&self.end_time)
    }
}

/// Raw tier input before defaulting and coercion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketTierInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub kind: Option<TierKind>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub quantity: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub public: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscountCodeInput {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub applicable_tiers: Vec<String>,
    #[serde(default)]
    pub max_uses: Option<i32>,
    #[serde(default)]
    pub discount_amount: Option<Decimal>,
    #[serde(default)]
    pub discount_type: Option<DiscountType>,
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
}

impl From<&DateSlot> for DateSlotInput {
    fn from(slot: &DateSlot) -> Self {
        DateSlotInput {
            start_date: Some(slot.starts_at.format("%Y-%m-%d").to_string()),
            start_time: Some(slot.starts_at.format("%H:%M").to_string()),
            end_date: Some(slot.ends_at.format("%Y-%m-%d").to_string()),
            end_time: Some(slot.ends_at.format("%H:%M").to_string()),
        }
    }
}

impl From<&TicketTier> for TicketTierInput {
    fn from(tier: &TicketTier) -> Self {
        TicketTierInput {
            name: Some(tier.name.clone()),
            kind: Some(tier.kind),
            price: Some(tier.price),
            quantity: Some(tier.quantity),
            description: tier.description.clone(),
            active: Some(tier.active),
            public: Some(tier.public),
        }
    }
}

impl From<&DiscountCode> for DiscountCodeInput {
    fn from(code: &DiscountCode) -> Self {
        DiscountCodeInput {
            code: Some(code.code.clone()),
            applicable_tiers: code.applicable_tiers.clone(),
            max_uses: Some(code.max_uses),
            discount_amount: Some(code.discount_amount),
            discount_type: Some(code.discount_type),
            valid_from: code.valid_from,
            valid_until: code.valid_until,
        }
    }
}

/// A candidate event payload as submitted by the authoring form. Everything
/// is optional here; validation decides what is acceptable and reports
/// every missing or invalid field at once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub location: Option<EventLocation>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub is_multi_date: bool,
    #[serde(default)]
    pub date_slots: Vec<DateSlotInput>,
    #[serde(default)]
    pub ticket_tiers: Vec<TicketTierInput>,
    #[serde(default)]
    pub discount_codes: Vec<DiscountCodeInput>,
    #[serde(default)]
    pub refund_policy: Option<RefundPolicy>,
    #[serde(default)]
    pub refund_policy_note: Option<String>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub organizer_contact: Option<OrganizerContact>,
}

impl From<&Event> for EventDraft {
    /// Reconstructs the raw draft form of a stored event. Partial updates
    /// merge their changes into this and go back through full validation.
    fn from(event: &Event) -> Self {
        EventDraft {
            name: Some(event.name.clone()),
            description: Some(event.description.clone()),
            genre: Some(event.genre.clone()),
            tags: event.tags.clone(),
            location: Some(event.location.clone()),
            files: event.files.clone(),
            is_multi_date: event.schedule.is_multi_date,
            date_slots: event.schedule.slots.iter().map(DateSlotInput::from).collect(),
            ticket_tiers: event
                .ticket_tiers
                .iter()
                .map(TicketTierInput::from)
                .collect(),
            discount_codes: event
                .discount_codes
                .iter()
                .map(DiscountCodeInput::from)
                .collect(),
            refund_policy: Some(event.settings.refund_policy),
            refund_policy_note: event.settings.refund_policy_note.clone(),
            visibility: Some(event.settings.visibility),
            organizer_contact: Some(event.organizer_contact.clone()),
        }
    }
}
