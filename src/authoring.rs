//! Staged construction of an event draft, mirroring the multi-section
//! authoring form: details, schedule, media, tiers, discount codes, policy
//! and organizer contact accumulate into one [`EventDraft`].
//!
//! The form enforces the UI invariants (at least one tier row is always
//! present) and runs the same validation as the backend before submitting,
//! reporting every offending field at once. A backend refusal carrying the
//! seller-upgrade code surfaces as [`SubmitOutcome::NeedsSellerUpgrade`] so
//! the caller can offer the upgrade flow instead of a dead-end error.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    validate_and_normalize, DateSlotInput, DiscountCodeInput, EventDraft, EventLocation,
    FieldError, NormalizedEvent, OrganizerContact, RefundPolicy, TicketTierInput, Visibility,
};
use crate::store::{EventStore, ProfileStore};
use crate::utils::error::AppError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("an event needs at least one ticket tier")]
    LastTier,
    #[error("no row at index {0}")]
    NoSuchRow(usize),
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("backend rejected the draft ({code}): {message}")]
    Rejected { code: String, message: String },
    #[error("transport failure: {0}")]
    Transport(String),
}

#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// Created; the caller hands off to the detail view for this id.
    Created { event_id: Uuid },
    /// The principal lacks seller capability; offer the upgrade path.
    NeedsSellerUpgrade,
    /// Local validation failed; every offending field is listed.
    Invalid(Vec<FieldError>),
}

/// The persistence endpoint the form submits to.
#[async_trait]
pub trait EventSubmitter: Send + Sync {
    async fn create_event(&self, draft: &EventDraft) -> Result<Uuid, SubmitError>;
}

#[derive(Debug, Default)]
pub struct EventAuthoringForm {
    draft: EventDraft,
}

impl EventAuthoringForm {
    /// Starts with a single empty tier row, matching the form's "at least
    /// one tier" rule.
    pub fn new() -> Self {
        Self {
            draft: EventDraft {
                ticket_tiers: vec![TicketTierInput::default()],
                ..EventDraft::default()
            },
        }
    }

    pub fn draft(&self) -> &EventDraft {
        &self.draft
    }

    pub fn set_details(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        genre: impl Into<String>,
    ) -> &mut Self {
        self.draft.name = Some(name.into());
        self.draft.description = Some(description.into());
        self.draft.genre = Some(genre.into());
        self
    }

    pub fn set_tags(&mut self, tags: Vec<String>) -> &mut Self {
        self.draft.tags = tags;
        self
    }

    pub fn set_location(&mut self, location: EventLocation) -> &mut Self {
        self.draft.location = Some(location);
        self
    }

    pub fn add_file(&mut self, url: impl Into<String>) -> &mut Self {
        self.draft.files.push(url.into());
        self
    }

    pub fn set_multi_date(&mut self, is_multi_date: bool) -> &mut Self {
        self.draft.is_multi_date = is_multi_date;
        self
    }

    pub fn add_date_slot(&mut self, slot: DateSlotInput) -> &mut Self {
        self.draft.date_slots.push(slot);
        self
    }

    pub fn add_tier(&mut self, tier: TicketTierInput) -> &mut Self {
        self.draft.ticket_tiers.push(tier);
        self
    }

    pub fn set_tier(&mut self, index: usize, tier: TicketTierInput) -> Result<(), FormError> {
        let slot = self
            .draft
            .ticket_tiers
            .get_mut(index)
            .ok_or(FormError::NoSuchRow(index))?;
        *slot = tier;
        Ok(())
    }

    /// The last remaining tier row cannot be removed.
    pub fn remove_tier(&mut self, index: usize) -> Result<(), FormError> {
        if index >= self.draft.ticket_tiers.len() {
            return Err(FormError::NoSuchRow(index));
        }
        if self.draft.ticket_tiers.len() == 1 {
            return Err(FormError::LastTier);
        }
        self.draft.ticket_tiers.remove(index);
        Ok(())
    }

    pub fn add_discount_code(&mut self, code: DiscountCodeInput) -> &mut Self {
        self.draft.discount_codes.push(code);
        self
    }

    /// Discount code rows, unlike tiers, may go down to zero.
    pub fn remove_discount_code(&mut self, index: usize) -> Result<(), FormError> {
        if index >= self.draft.discount_codes.len() {
            return Err(FormError::NoSuchRow(index));
        }
        self.draft.discount_codes.remove(index);
        Ok(())
    }

    pub fn set_refund_policy(
        &mut self,
        policy: RefundPolicy,
        note: Option<String>,
    ) -> &mut Self {
        self.draft.refund_policy = Some(policy);
        self.draft.refund_policy_note = note;
        self
    }

    pub fn set_visibility(&mut self, visibility: Visibility) -> &mut Self {
        self.draft.visibility = Some(visibility);
        self
    }

    pub fn set_contact(&mut self, contact: OrganizerContact) -> &mut Self {
        self.draft.organizer_contact = Some(contact);
        self
    }

    /// Same rules the backend applies on create.
    pub fn validate(&self) -> Result<NormalizedEvent, Vec<FieldError>> {
        validate_and_normalize(&self.draft)
    }

    /// Validates locally, then submits. Local failures never reach the
    /// backend.
    pub async fn submit<S: EventSubmitter>(&self, api: &S) -> Result<SubmitOutcome, SubmitError> {
        if let Err(errors) = validate_and_normalize(&self.draft) {
            return Ok(SubmitOutcome::Invalid(errors));
        }
        match api.create_event(&self.draft).await {
            Ok(event_id) => Ok(SubmitOutcome::Created { event_id }),
            Err(SubmitError::Rejected { code, .. }) if code == "SELLER_UPGRADE_REQUIRED" => {
                Ok(SubmitOutcome::NeedsSellerUpgrade)
            }
            Err(e) => Err(e),
        }
    }
}

/// Submits directly against an in-process [`AppState`], running the same
/// capability check and validation as the HTTP handler.
///
/// [`AppState`]: crate::AppState
pub struct LocalSubmitter {
    pub state: crate::AppState,
    pub identity: crate::auth::Identity,
}

#[async_trait]
impl EventSubmitter for LocalSubmitter {
    async fn create_event(&self, draft: &EventDraft) -> Result<Uuid, SubmitError> {
        let profile = self
            .state
            .profiles
            .find_by_uid(&self.identity.uid)
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))?
            .ok_or_else(|| SubmitError::Rejected {
                code: "AUTH_ERROR".to_string(),
                message: "No profile exists for this identity".to_string(),
            })?;
        if !profile.can_create_events() {
            let err = AppError::SellerUpgradeRequired;
            return Err(SubmitError::Rejected {
                code: err.code().to_string(),
                message: err.to_string(),
            });
        }
        let normalized = validate_and_normalize(draft).map_err(|errors| SubmitError::Rejected {
            code: "VALIDATION_ERROR".to_string(),
            message: format!("{} field(s) missing or invalid", errors.len()),
        })?;
        let event = normalized.into_event(profile.id);
        self.state
            .events
            .insert(&event)
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))?;
        Ok(event.id)
    }
}
