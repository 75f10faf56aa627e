//! Shared test harness: in-memory store implementations and an in-process
//! app driven through `tower::ServiceExt::oneshot`, so the API tests need
//! neither a network listener nor a database.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use stagepass_server::auth::IdentityVerifier;
use stagepass_server::models::{Event, Role, SellerInfo, TicketPurchase, UserProfile};
use stagepass_server::routes::create_routes;
use stagepass_server::store::{
    EventStore, NewProfile, ProfileStore, ProfileUpdate, PurchaseStore,
};
use stagepass_server::utils::error::AppResult;
use stagepass_server::AppState;

pub const TEST_IDENTITY_SECRET: &[u8] = b"integration-test-identity-secret";

#[derive(Default)]
pub struct MemoryEventStore {
    events: Mutex<HashMap<Uuid, Event>>,
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert(&self, event: &Event) -> AppResult<()> {
        self.events
            .lock()
            .unwrap()
            .insert(event.id, event.clone());
        Ok(())
    }

    async fn update(&self, event: &Event) -> AppResult<bool> {
        let mut events = self.events.lock().unwrap();
        match events.get_mut(&event.id) {
            Some(slot) => {
                *slot = event.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Event>> {
        Ok(self.events.lock().unwrap().get(&id).cloned())
    }

    async fn list_public(&self) -> AppResult<Vec<Event>> {
        let mut events: Vec<Event> = self
            .events
            .lock()
            .unwrap()
            .values()
            .filter(|e| {
                e.is_published()
                    && e.settings.visibility == stagepass_server::models::Visibility::Public
            })
            .cloned()
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> AppResult<Vec<Event>> {
        let mut events: Vec<Event> = self
            .events
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.owner_id == owner_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }

    async fn find_by_invitation_token(&self, token: &str) -> AppResult<Option<Event>> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .values()
            .find(|e| e.settings.invitation_token.as_deref() == Some(token))
            .cloned())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.events.lock().unwrap().remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: Mutex<HashMap<String, UserProfile>>,
    creates: Mutex<u32>,
}

impl MemoryProfileStore {
    pub fn profile_count(&self) -> usize {
        self.profiles.lock().unwrap().len()
    }

    pub fn create_calls(&self) -> u32 {
        *self.creates.lock().unwrap()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn find_by_uid(&self, uid: &str) -> AppResult<Option<UserProfile>> {
        Ok(self.profiles.lock().unwrap().get(uid).cloned())
    }

    async fn create(&self, new_profile: NewProfile) -> AppResult<UserProfile> {
        *self.creates.lock().unwrap() += 1;
        let mut profiles = self.profiles.lock().unwrap();
        // Same outcome as the unique-key race in Postgres: the first
        // writer's profile wins.
        if let Some(existing) = profiles.get(&new_profile.firebase_uid) {
            return Ok(existing.clone());
        }
        let now = Utc::now();
        let profile = UserProfile {
            id: Uuid::new_v4(),
            firebase_uid: new_profile.firebase_uid.clone(),
            email: new_profile.email,
            display_name: new_profile.display_name,
            role: new_profile.role,
            profile_picture: new_profile.profile_picture,
            is_active: true,
            last_login: Some(now),
            seller_info: new_profile.seller_info,
            created_at: now,
            updated_at: now,
        };
        profiles.insert(new_profile.firebase_uid, profile.clone());
        Ok(profile)
    }

    async fn update(&self, uid: &str, update: ProfileUpdate) -> AppResult<Option<UserProfile>> {
        let mut profiles = self.profiles.lock().unwrap();
        let Some(profile) = profiles.get_mut(uid) else {
            return Ok(None);
        };
        if let Some(email) = update.email {
            profile.email = email;
        }
        if update.display_name.is_some() {
            profile.display_name = update.display_name;
        }
        if update.profile_picture.is_some() {
            profile.profile_picture = update.profile_picture;
        }
        if update.seller_info.is_some() {
            profile.seller_info = update.seller_info;
        }
        profile.updated_at = Utc::now();
        Ok(Some(profile.clone()))
    }

    async fn upgrade_to_seller(
        &self,
        uid: &str,
        info: SellerInfo,
    ) -> AppResult<Option<UserProfile>> {
        let mut profiles = self.profiles.lock().unwrap();
        let Some(profile) = profiles.get_mut(uid) else {
            return Ok(None);
        };
        if profile.role != Role::Admin {
            profile.role = Role::Seller;
        }
        profile.seller_info = Some(info);
        profile.updated_at = Utc::now();
        Ok(Some(profile.clone()))
    }

    async fn touch_login(&self, uid: &str) -> AppResult<()> {
        if let Some(profile) = self.profiles.lock().unwrap().get_mut(uid) {
            profile.last_login = Some(Utc::now());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPurchaseStore {
    purchases: Mutex<HashMap<Uuid, TicketPurchase>>,
}

#[async_trait]
impl PurchaseStore for MemoryPurchaseStore {
    async fn insert(&self, purchase: &TicketPurchase) -> AppResult<()> {
        self.purchases
            .lock()
            .unwrap()
            .insert(purchase.id, purchase.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<TicketPurchase>> {
        Ok(self.purchases.lock().unwrap().get(&id).cloned())
    }

    async fn list_for_event(&self, event_id: Uuid) -> AppResult<Vec<TicketPurchase>> {
        Ok(self
            .purchases
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.event_id == event_id)
            .cloned()
            .collect())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub verifier: IdentityVerifier,
    pub profiles: Arc<MemoryProfileStore>,
    pub events: Arc<MemoryEventStore>,
    pub purchases: Arc<MemoryPurchaseStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let events = Arc::new(MemoryEventStore::default());
        let profiles = Arc::new(MemoryProfileStore::default());
        let purchases = Arc::new(MemoryPurchaseStore::default());
        let verifier = IdentityVerifier::new(TEST_IDENTITY_SECRET);
        let state = AppState::with_stores(
            events.clone(),
            profiles.clone(),
            purchases.clone(),
            verifier.clone(),
            "https://media.test.local".to_string(),
        );
        let router = create_routes(state.clone());
        Self {
            router,
            state,
            verifier,
            profiles,
            events,
            purchases,
        }
    }

    pub fn token(&self, uid: &str, email: &str) -> String {
        self.verifier
            .issue(uid, email, None, 300)
            .expect("token must mint")
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request must not fail at the transport level");
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, path, token, None).await
    }

    pub async fn post(
        &self,
        path: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        self.request(Method::POST, path, token, Some(body)).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, path, token, Some(body)).await
    }

    pub async fn patch(
        &self,
        path: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        self.request(Method::PATCH, path, token, Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, path, token, None).await
    }

    /// Reads a stored event directly, bypassing the API.
    pub async fn events_snapshot(&self, id: Uuid) -> Event {
        self.events
            .get(id)
            .await
            .unwrap()
            .expect("event must exist in the store")
    }

    /// Overwrites a stored event directly, bypassing the API.
    pub async fn replace_event(&self, event: Event) {
        self.events.update(&event).await.unwrap();
    }
}

/// A complete, valid event draft; tests tweak individual fields.
pub fn valid_event_draft() -> Value {
    serde_json::json!({
        "name": "Gala Night",
        "description": "An evening gala with live music",
        "genre": "music",
        "tags": ["gala", "live"],
        "location": {
            "event_type": "physical",
            "venue_name": "City Hall",
            "street_address": "1 Main St",
            "city": "Springfield",
            "state": "IL",
            "postal_code": "62701",
            "country": "US"
        },
        "files": ["https://cdn.test.local/banner.png"],
        "is_multi_date": false,
        "date_slots": [{
            "start_date": "2026-09-01",
            "start_time": "18:00",
            "end_date": "2026-09-01",
            "end_time": "23:00"
        }],
        "ticket_tiers": [{
            "name": "General",
            "kind": "paid",
            "price": "25",
            "quantity": 100
        }],
        "refund_policy": "14_days",
        "visibility": "public",
        "organizer_contact": { "email": "host@test.local" }
    })
}

/// Registers a seller profile and returns its bearer token.
pub async fn signup_seller(app: &TestApp, uid: &str, email: &str) -> String {
    let token = app.token(uid, email);
    let (status, _) = app
        .post(
            "/auth/user",
            Some(&token),
            serde_json::json!({
                "role": "seller",
                "seller_info": { "company_name": "Test Events LLC" }
            }),
        )
        .await;
    assert!(
        status.is_success(),
        "seller signup should succeed, got {status}"
    );
    token
}

/// Registers a plain user profile and returns its bearer token.
pub async fn signup_user(app: &TestApp, uid: &str, email: &str) -> String {
    let token = app.token(uid, email);
    let (status, _) = app
        .post("/auth/user", Some(&token), serde_json::json!({}))
        .await;
    assert!(
        status.is_success(),
        "user signup should succeed, got {status}"
    );
    token
}
