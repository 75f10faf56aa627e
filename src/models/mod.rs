pub mod event;
pub mod profile;
pub mod purchase;
pub mod validate;

pub use event::{
    DateSlot, DateSlotInput, DiscountCode, DiscountCodeInput, DiscountType, Event, EventDraft, EventLocation,
    EventSchedule, EventSettings, EventType, OrganizerContact, PublishStatus, RefundPolicy,
    TicketTier, TicketTierInput, TierKind, Visibility,
};
pub use profile::{Role, SellerInfo, UserProfile};
pub use purchase::{PaymentMethod, PurchaseStatus, TicketCode, TicketPurchase};
pub use validate::{validate_and_normalize, validate_event_content, FieldError, NormalizedEvent};
