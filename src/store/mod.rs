//! Persistence traits and their Postgres implementations.
//!
//! The event aggregate's nested collections live in JSONB columns, so each
//! event row reads and writes as one document. Handlers and the session
//! synchronizer only see the traits; tests swap in in-memory stores.

pub mod events;
pub mod profiles;
pub mod purchases;

pub use events::PgEventStore;
pub use profiles::PgProfileStore;
pub use purchases::PgPurchaseStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Event, Role, SellerInfo, TicketPurchase, UserProfile};
use crate::utils::error::AppResult;

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert(&self, event: &Event) -> AppResult<()>;
    /// Full-row write; false when no such event exists.
    async fn update(&self, event: &Event) -> AppResult<bool>;
    async fn get(&self, id: Uuid) -> AppResult<Option<Event>>;
    /// Published, publicly visible events, newest first.
    async fn list_public(&self) -> AppResult<Vec<Event>>;
    async fn list_for_owner(&self, owner_id: Uuid) -> AppResult<Vec<Event>>;
    async fn find_by_invitation_token(&self, token: &str) -> AppResult<Option<Event>>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub firebase_uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub profile_picture: Option<String>,
    pub seller_info: Option<SellerInfo>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub profile_picture: Option<String>,
    pub seller_info: Option<SellerInfo>,
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_by_uid(&self, uid: &str) -> AppResult<Option<UserProfile>>;
    /// Creates a profile. When another writer wins the unique-key race the
    /// already-created profile is returned instead of an error.
    async fn create(&self, new_profile: NewProfile) -> AppResult<UserProfile>;
    async fn update(&self, uid: &str, update: ProfileUpdate) -> AppResult<Option<UserProfile>>;
    /// Escalates to seller and stores the business fields. Admins keep
    /// their role. None when no profile exists for the key.
    async fn upgrade_to_seller(&self, uid: &str, info: SellerInfo)
        -> AppResult<Option<UserProfile>>;
    async fn touch_login(&self, uid: &str) -> AppResult<()>;
}

#[async_trait]
pub trait PurchaseStore: Send + Sync {
    async fn insert(&self, purchase: &TicketPurchase) -> AppResult<()>;
    async fn get(&self, id: Uuid) -> AppResult<Option<TicketPurchase>>;
    async fn list_for_event(&self, event_id: Uuid) -> AppResult<Vec<TicketPurchase>>;
}
