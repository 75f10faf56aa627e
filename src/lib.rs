//! StagePass - ticketing marketplace backend.
//!
//! Sellers create events with ticket tiers, discount codes and visibility
//! settings; buyers browse published events and purchase tickets (checkout
//! stubbed). Identity lives at an external provider; this service verifies
//! its credentials and keeps one profile per identity.

pub mod auth;
pub mod authoring;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod store;
pub mod utils;

use std::sync::Arc;

use sqlx::PgPool;

use auth::{IdentityLocks, IdentityVerifier};
use config::Config;
use store::{EventStore, PgEventStore, PgProfileStore, PgPurchaseStore, ProfileStore, PurchaseStore};

#[derive(Clone)]
pub struct AppState {
    pub events: Arc<dyn EventStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub purchases: Arc<dyn PurchaseStore>,
    pub identity: IdentityVerifier,
    pub signups: IdentityLocks,
    pub upload_base_url: String,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> Self {
        Self::with_stores(
            Arc::new(PgEventStore::new(pool.clone())),
            Arc::new(PgProfileStore::new(pool.clone())),
            Arc::new(PgPurchaseStore::new(pool)),
            IdentityVerifier::new(config.identity_jwt_secret.as_bytes()),
            config.upload_base_url.clone(),
        )
    }

    /// Wires arbitrary store implementations; tests use this with
    /// in-memory stores.
    pub fn with_stores(
        events: Arc<dyn EventStore>,
        profiles: Arc<dyn ProfileStore>,
        purchases: Arc<dyn PurchaseStore>,
        identity: IdentityVerifier,
        upload_base_url: String,
    ) -> Self {
        Self {
            events,
            profiles,
            purchases,
            identity,
            signups: IdentityLocks::new(),
            upload_base_url,
        }
    }
}
