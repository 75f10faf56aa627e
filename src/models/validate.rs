//! Event aggregate validation and normalization.
//!
//! [`validate_and_normalize`] turns a raw [`EventDraft`] into a
//! persist-ready [`NormalizedEvent`] or a list of field errors. Errors are
//! accumulated across the whole draft so callers can surface every problem
//! at once instead of failing on the first.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::event::{
    DateSlot, DateSlotInput, DiscountCode, DiscountCodeInput, Event, EventDraft, EventLocation,
    EventSchedule, OrganizerContact, RefundPolicy, TicketTier, TicketTierInput, TierKind,
    Visibility,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A validated event body, ready to be persisted. Identity, ownership,
/// publish state and timestamps are attached by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub name: String,
    pub description: String,
    pub genre: String,
    pub tags: Vec<String>,
    pub location: EventLocation,
    pub files: Vec<String>,
    pub schedule: EventSchedule,
    pub ticket_tiers: Vec<TicketTier>,
    pub discount_codes: Vec<DiscountCode>,
    pub refund_policy: RefundPolicy,
    pub refund_policy_note: Option<String>,
    pub visibility: Visibility,
    pub organizer_contact: OrganizerContact,
}

impl NormalizedEvent {
    /// Materializes a fresh draft-status event owned by `owner_id`.
    /// Private events receive their invitation token right away so the
    /// link exists before publish.
    pub fn into_event(self, owner_id: uuid::Uuid) -> Event {
        let now = Utc::now();
        let invitation_token = match self.visibility {
            Visibility::Private => Some(crate::utils::token::secure_token()),
            Visibility::Public => None,
        };
        Event {
            id: uuid::Uuid::new_v4(),
            owner_id,
            name: self.name,
            description: self.description,
            genre: self.genre,
            tags: self.tags,
            location: self.location,
            files: self.files,
            schedule: self.schedule,
            ticket_tiers: self.ticket_tiers,
            discount_codes: self.discount_codes,
            settings: crate::models::event::EventSettings {
                refund_policy: self.refund_policy,
                refund_policy_note: self.refund_policy_note,
                visibility: self.visibility,
                invitation_token,
                publish_status: crate::models::event::PublishStatus::Draft,
            },
            organizer_contact: self.organizer_contact,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces an existing event's content, keeping identity, ownership
    /// and publish state. Switching to private keeps an existing token or
    /// mints one; switching to public drops it.
    pub fn apply_to(self, event: &mut Event) {
        event.name = self.name;
        event.description = self.description;
        event.genre = self.genre;
        event.tags = self.tags;
        event.location = self.location;
        event.files = self.files;
        event.schedule = self.schedule;
        event.ticket_tiers = self.ticket_tiers;
        event.discount_codes = self.discount_codes;
        event.settings.refund_policy = self.refund_policy;
        event.settings.refund_policy_note = self.refund_policy_note;
        event.settings.invitation_token = match self.visibility {
            Visibility::Private => event
                .settings
                .invitation_token
                .take()
                .or_else(|| Some(crate::utils::token::secure_token())),
            Visibility::Public => None,
        };
        event.settings.visibility = self.visibility;
        event.organizer_contact = self.organizer_contact;
        event.updated_at = Utc::now();
    }
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}

const PERCENT_MAX: Decimal = Decimal::ONE_HUNDRED;

/// Validates a draft and produces the normalized aggregate.
///
/// Required: name, description, genre, at least one tag, a full venue
/// address when the event type needs one, at least one media file, at
/// least one complete date slot, at least one ticket tier, a refund policy
/// and a visibility. Tier and discount rows are defaulted and coerced as
/// they are checked; free tiers always end up with price 0.
pub fn validate_and_normalize(draft: &EventDraft) -> Result<NormalizedEvent, Vec<FieldError>> {
    let mut errors = Vec::new();

    if blank(&draft.name) {
        errors.push(FieldError::new("name", "Event name is required"));
    }
    if blank(&draft.description) {
        errors.push(FieldError::new("description", "Description is required"));
    }
    if blank(&draft.genre) {
        errors.push(FieldError::new("genre", "Genre is required"));
    }

    let tags: Vec<String> = draft
        .tags
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if tags.is_empty() {
        errors.push(FieldError::new("tags", "At least one tag is required"));
    }

    let location = match &draft.location {
        Some(location) => {
            check_location(location, &mut errors);
            Some(location.clone())
        }
        None => {
            errors.push(FieldError::new("location", "Event location is required"));
            None
        }
    };

    if draft.files.is_empty() {
        errors.push(FieldError::new(
            "files",
            "At least one uploaded media file is required",
        ));
    }

    let schedule = normalize_schedule(draft.is_multi_date, &draft.date_slots, &mut errors);
    let ticket_tiers = normalize_tiers(&draft.ticket_tiers, &mut errors);
    let discount_codes = normalize_discount_codes(&draft.discount_codes, &ticket_tiers, &mut errors);

    if draft.refund_policy.is_none() {
        errors.push(FieldError::new("refund_policy", "Refund policy is required"));
    }
    if draft.visibility.is_none() {
        errors.push(FieldError::new("visibility", "Visibility is required"));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NormalizedEvent {
        name: draft.name.clone().unwrap_or_default().trim().to_string(),
        description: draft
            .description
            .clone()
            .unwrap_or_default()
            .trim()
            .to_string(),
        genre: draft.genre.clone().unwrap_or_default().trim().to_string(),
        tags,
        location: location.unwrap_or(EventLocation {
            event_type: super::event::EventType::Online,
            venue_name: None,
            street_address: None,
            city: None,
            state: None,
            postal_code: None,
            country: None,
        }),
        files: draft.files.clone(),
        schedule: schedule.unwrap_or(EventSchedule {
            is_multi_date: draft.is_multi_date,
            slots: Vec::new(),
        }),
        ticket_tiers,
        discount_codes,
        refund_policy: draft.refund_policy.unwrap_or(RefundPolicy::NoRefund),
        refund_policy_note: draft.refund_policy_note.clone(),
        visibility: draft.visibility.unwrap_or(Visibility::Public),
        organizer_contact: draft.organizer_contact.clone().unwrap_or_default(),
    })
}

fn check_location(location: &EventLocation, errors: &mut Vec<FieldError>) {
    if !location.event_type.requires_venue() {
        return;
    }
    let required = [
        ("location.venue_name", &location.venue_name),
        ("location.street_address", &location.street_address),
        ("location.city", &location.city),
        ("location.state", &location.state),
        ("location.postal_code", &location.postal_code),
        ("location.country", &location.country),
    ];
    for (field, value) in required {
        if blank(value) {
            errors.push(FieldError::new(
                field,
                "Required for physical and hybrid events",
            ));
        }
    }
}

fn normalize_schedule(
    is_multi_date: bool,
    slots: &[DateSlotInput],
    errors: &mut Vec<FieldError>,
) -> Option<EventSchedule> {
    // Single-date events only ever keep the first slot.
    let considered: &[DateSlotInput] = if is_multi_date {
        slots
    } else {
        slots.get(..1).unwrap_or(&[])
    };

    if considered.is_empty() {
        errors.push(FieldError::new(
            "date_slots",
            "At least one complete date slot is required",
        ));
        return None;
    }

    let before = errors.len();
    let mut normalized = Vec::with_capacity(considered.len());
    for (index, slot) in considered.iter().enumerate() {
        let field = format!("date_slots[{index}]");
        if !slot.is_complete() {
            errors.push(FieldError::new(
                field,
                "Start date, start time, end date and end time are all required",
            ));
            continue;
        }
        let starts_at = parse_slot_edge(&slot.start_date, &slot.start_time);
        let ends_at = parse_slot_edge(&slot.end_date, &slot.end_time);
        match (starts_at, ends_at) {
            (Some(starts_at), Some(ends_at)) => {
                if starts_at > ends_at {
                    errors.push(FieldError::new(field, "Slot start must not be after its end"));
                } else {
                    normalized.push(DateSlot { starts_at, ends_at });
                }
            }
            _ => errors.push(FieldError::new(field, "Unparseable date or time")),
        }
    }

    if errors.len() > before {
        return None;
    }
    Some(EventSchedule {
        is_multi_date,
        slots: normalized,
    })
}

fn parse_slot_edge(date: &Option<String>, time: &Option<String>) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(date.as_deref()?.trim(), "%Y-%m-%d").ok()?;
    let raw_time = time.as_deref()?.trim();
    let time = NaiveTime::parse_from_str(raw_time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw_time, "%H:%M:%S"))
        .ok()?;
    Some(date.and_time(time).and_utc())
}

fn normalize_tiers(tiers: &[TicketTierInput], errors: &mut Vec<FieldError>) -> Vec<TicketTier> {
    if tiers.is_empty() {
        errors.push(FieldError::new(
            "ticket_tiers",
            "At least one ticket tier is required",
        ));
        return Vec::new();
    }

    let mut normalized = Vec::with_capacity(tiers.len());
    for (index, tier) in tiers.iter().enumerate() {
        let field = |name: &str| format!("ticket_tiers[{index}].{name}");

        if blank(&tier.name) {
            errors.push(FieldError::new(field("name"), "Tier name is required"));
        }

        let kind = tier.kind.unwrap_or_default();
        let price = match kind {
            // Free tiers carry price 0 regardless of what was entered.
            TierKind::Free => Decimal::ZERO,
            _ => {
                let price = tier.price.unwrap_or(Decimal::ZERO);
                if price < Decimal::ZERO {
                    errors.push(FieldError::new(field("price"), "Price must not be negative"));
                }
                price
            }
        };

        let quantity = tier.quantity.unwrap_or(0);
        if quantity < 0 {
            errors.push(FieldError::new(
                field("quantity"),
                "Quantity must be a non-negative integer",
            ));
        }

        normalized.push(TicketTier {
            name: tier.name.clone().unwrap_or_default().trim().to_string(),
            kind,
            price,
            quantity,
            description: tier.description.clone(),
            active: tier.active.unwrap_or(true),
            public: tier.public.unwrap_or(true),
        });
    }
    normalized
}

fn normalize_discount_codes(
    codes: &[DiscountCodeInput],
    tiers: &[TicketTier],
    errors: &mut Vec<FieldError>,
) -> Vec<DiscountCode> {
    let mut normalized = Vec::with_capacity(codes.len());
    for (index, code) in codes.iter().enumerate() {
        let field = |name: &str| format!("discount_codes[{index}].{name}");

        if blank(&code.code) {
            errors.push(FieldError::new(field("code"), "Code is required"));
        }

        for tier_name in &code.applicable_tiers {
            if !tiers.iter().any(|t| &t.name == tier_name) {
                errors.push(FieldError::new(
                    field("applicable_tiers"),
                    format!("No ticket tier named '{tier_name}' exists"),
                ));
            }
        }

        let max_uses = code.max_uses.unwrap_or(0);
        if max_uses < 0 {
            errors.push(FieldError::new(
                field("max_uses"),
                "Max uses must not be negative (0 means unlimited)",
            ));
        }

        let discount_amount = code.discount_amount.unwrap_or(Decimal::ZERO);
        if discount_amount < Decimal::ZERO {
            errors.push(FieldError::new(
                field("discount_amount"),
                "Discount amount must not be negative",
            ));
        }

        let discount_type = match code.discount_type {
            Some(discount_type) => discount_type,
            None => {
                errors.push(FieldError::new(
                    field("discount_type"),
                    "Discount type is required",
                ));
                super::event::DiscountType::Fixed
            }
        };
        if discount_type == super::event::DiscountType::Percentage && discount_amount > PERCENT_MAX
        {
            errors.push(FieldError::new(
                field("discount_amount"),
                "Percentage discounts cannot exceed 100",
            ));
        }

        if let (Some(from), Some(until)) = (code.valid_from, code.valid_until) {
            if from > until {
                errors.push(FieldError::new(
                    field("valid_from"),
                    "Validity window start must not be after its end",
                ));
            }
        }

        normalized.push(DiscountCode {
            code: code.code.clone().unwrap_or_default().trim().to_string(),
            applicable_tiers: code.applicable_tiers.clone(),
            max_uses,
            discount_amount,
            discount_type,
            valid_from: code.valid_from,
            valid_until: code.valid_until,
        });
    }
    normalized
}

/// Re-checks an already-normalized aggregate. Publish runs this so a draft
/// that lost required fields through partial updates cannot go live, and
/// partial updates run it after merging.
pub fn validate_event_content(event: &Event) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if event.name.trim().is_empty() {
        errors.push(FieldError::new("name", "Event name is required"));
    }
    if event.description.trim().is_empty() {
        errors.push(FieldError::new("description", "Description is required"));
    }
    if event.genre.trim().is_empty() {
        errors.push(FieldError::new("genre", "Genre is required"));
    }
    if event.tags.iter().all(|t| t.trim().is_empty()) {
        errors.push(FieldError::new("tags", "At least one tag is required"));
    }
    check_location(&event.location, &mut errors);
    if event.files.is_empty() {
        errors.push(FieldError::new(
            "files",
            "At least one uploaded media file is required",
        ));
    }
    if event.schedule.slots.is_empty() {
        errors.push(FieldError::new(
            "date_slots",
            "At least one complete date slot is required",
        ));
    }
    for (index, slot) in event.schedule.slots.iter().enumerate() {
        if slot.starts_at > slot.ends_at {
            errors.push(FieldError::new(
                format!("date_slots[{index}]"),
                "Slot start must not be after its end",
            ));
        }
    }
    if event.ticket_tiers.is_empty() {
        errors.push(FieldError::new(
            "ticket_tiers",
            "At least one ticket tier is required",
        ));
    }
    for (index, tier) in event.ticket_tiers.iter().enumerate() {
        if tier.name.trim().is_empty() {
            errors.push(FieldError::new(
                format!("ticket_tiers[{index}].name"),
                "Tier name is required",
            ));
        }
        if tier.kind == TierKind::Free && tier.price != Decimal::ZERO {
            errors.push(FieldError::new(
                format!("ticket_tiers[{index}].price"),
                "Free tiers must have price 0",
            ));
        }
        if tier.price < Decimal::ZERO {
            errors.push(FieldError::new(
                format!("ticket_tiers[{index}].price"),
                "Price must not be negative",
            ));
        }
        if tier.quantity < 0 {
            errors.push(FieldError::new(
                format!("ticket_tiers[{index}].quantity"),
                "Quantity must be a non-negative integer",
            ));
        }
    }
    for (index, code) in event.discount_codes.iter().enumerate() {
        for tier_name in &code.applicable_tiers {
            if event.tier(tier_name).is_none() {
                errors.push(FieldError::new(
                    format!("discount_codes[{index}].applicable_tiers"),
                    format!("No ticket tier named '{tier_name}' exists"),
                ));
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::{DiscountType, EventType};
    use rust_decimal_macros::dec;

    fn complete_draft() -> EventDraft {
        EventDraft {
            name: Some("Gala".into()),
            description: Some("An evening gala".into()),
            genre: Some("music".into()),
            tags: vec!["gala".into(), "live".into()],
            location: Some(EventLocation {
                event_type: EventType::Physical,
                venue_name: Some("City Hall".into()),
                street_address: Some("1 Main St".into()),
                city: Some("Springfield".into()),
                state: Some("IL".into()),
                postal_code: Some("62701".into()),
                country: Some("US".into()),
            }),
            files: vec!["https://cdn.example.com/banner.png".into()],
            is_multi_date: false,
            date_slots: vec![DateSlotInput {
                start_date: Some("2026-09-01".into()),
                start_time: Some("18:00".into()),
                end_date: Some("2026-09-01".into()),
                end_time: Some("23:00".into()),
            }],
            ticket_tiers: vec![TicketTierInput {
                name: Some("General".into()),
                kind: Some(TierKind::Paid),
                price: Some(dec!(25)),
                quantity: Some(100),
                ..Default::default()
            }],
            discount_codes: Vec::new(),
            refund_policy: Some(RefundPolicy::FourteenDays),
            refund_policy_note: None,
            visibility: Some(Visibility::Public),
            organizer_contact: Some(OrganizerContact {
                email: Some("host@example.com".into()),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn complete_draft_normalizes() {
        let normalized = validate_and_normalize(&complete_draft()).unwrap();
        assert_eq!(normalized.name, "Gala");
        assert_eq!(normalized.schedule.slots.len(), 1);
        assert_eq!(normalized.ticket_tiers.len(), 1);
    }

    #[test]
    fn missing_tags_is_rejected_with_tags_error() {
        let mut draft = complete_draft();
        draft.tags.clear();
        let errors = validate_and_normalize(&draft).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "tags"));
    }

    #[test]
    fn every_missing_field_is_reported_at_once() {
        let errors = validate_and_normalize(&EventDraft::default()).unwrap_err();
        for field in [
            "name",
            "description",
            "genre",
            "tags",
            "location",
            "files",
            "date_slots",
            "ticket_tiers",
            "refund_policy",
            "visibility",
        ] {
            assert!(
                errors.iter().any(|e| e.field == field),
                "expected an error for {field}, got {errors:?}"
            );
        }
    }

    #[test]
    fn free_tier_price_is_forced_to_zero() {
        let mut draft = complete_draft();
        draft.ticket_tiers = vec![TicketTierInput {
            name: Some("Entry".into()),
            kind: Some(TierKind::Free),
            price: Some(dec!(25)),
            quantity: Some(10),
            ..Default::default()
        }];
        let normalized = validate_and_normalize(&draft).unwrap();
        assert_eq!(normalized.ticket_tiers[0].price, Decimal::ZERO);
        assert_eq!(normalized.ticket_tiers[0].quantity, 10);
    }

    #[test]
    fn tier_defaults_apply() {
        let mut draft = complete_draft();
        draft.ticket_tiers = vec![TicketTierInput {
            name: Some("Entry".into()),
            ..Default::default()
        }];
        let normalized = validate_and_normalize(&draft).unwrap();
        let tier = &normalized.ticket_tiers[0];
        assert_eq!(tier.kind, TierKind::Free);
        assert_eq!(tier.price, Decimal::ZERO);
        assert!(tier.active);
        assert!(tier.public);
    }

    #[test]
    fn slot_start_after_end_is_rejected() {
        let mut draft = complete_draft();
        draft.date_slots = vec![DateSlotInput {
            start_date: Some("2026-09-02".into()),
            start_time: Some("18:00".into()),
            end_date: Some("2026-09-01".into()),
            end_time: Some("23:00".into()),
        }];
        let errors = validate_and_normalize(&draft).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "date_slots[0]"));
    }

    #[test]
    fn single_date_keeps_only_first_slot() {
        let mut draft = complete_draft();
        draft.is_multi_date = false;
        draft.date_slots.push(DateSlotInput {
            start_date: Some("2026-09-05".into()),
            start_time: Some("18:00".into()),
            end_date: Some("2026-09-05".into()),
            end_time: Some("23:00".into()),
        });
        let normalized = validate_and_normalize(&draft).unwrap();
        assert_eq!(normalized.schedule.slots.len(), 1);
    }

    #[test]
    fn venue_fields_required_for_physical_events() {
        let mut draft = complete_draft();
        draft.location = Some(EventLocation {
            event_type: EventType::Physical,
            venue_name: None,
            street_address: None,
            city: None,
            state: None,
            postal_code: None,
            country: None,
        });
        let errors = validate_and_normalize(&draft).unwrap_err();
        assert_eq!(
            errors
                .iter()
                .filter(|e| e.field.starts_with("location."))
                .count(),
            6
        );
    }

    #[test]
    fn venue_fields_not_required_for_online_events() {
        let mut draft = complete_draft();
        draft.location = Some(EventLocation {
            event_type: EventType::Online,
            venue_name: None,
            street_address: None,
            city: None,
            state: None,
            postal_code: None,
            country: None,
        });
        assert!(validate_and_normalize(&draft).is_ok());
    }

    #[test]
    fn discount_code_must_reference_existing_tier() {
        let mut draft = complete_draft();
        draft.discount_codes = vec![DiscountCodeInput {
            code: Some("EARLY".into()),
            applicable_tiers: vec!["VIP".into()],
            discount_amount: Some(dec!(10)),
            discount_type: Some(DiscountType::Fixed),
            ..Default::default()
        }];
        let errors = validate_and_normalize(&draft).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.field == "discount_codes[0].applicable_tiers"));
    }

    #[test]
    fn percentage_discount_over_100_is_rejected() {
        let mut draft = complete_draft();
        draft.discount_codes = vec![DiscountCodeInput {
            code: Some("BIG".into()),
            applicable_tiers: vec!["General".into()],
            discount_amount: Some(dec!(120)),
            discount_type: Some(DiscountType::Percentage),
            ..Default::default()
        }];
        let errors = validate_and_normalize(&draft).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.field == "discount_codes[0].discount_amount"));
    }
}
