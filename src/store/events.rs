use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::EventStore;
use crate::models::{
    DiscountCode, Event, EventLocation, EventSchedule, EventSettings, OrganizerContact, TicketTier,
};
use crate::utils::error::AppResult;

pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct EventRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    description: String,
    genre: String,
    tags: Json<Vec<String>>,
    location: Json<EventLocation>,
    files: Json<Vec<String>>,
    schedule: Json<EventSchedule>,
    ticket_tiers: Json<Vec<TicketTier>>,
    discount_codes: Json<Vec<DiscountCode>>,
    settings: Json<EventSettings>,
    organizer_contact: Json<OrganizerContact>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            description: row.description,
            genre: row.genre,
            tags: row.tags.0,
            location: row.location.0,
            files: row.files.0,
            schedule: row.schedule.0,
            ticket_tiers: row.ticket_tiers.0,
            discount_codes: row.discount_codes.0,
            settings: row.settings.0,
            organizer_contact: row.organizer_contact.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_EVENT: &str = "SELECT id, owner_id, name, description, genre, tags, location, \
     files, schedule, ticket_tiers, discount_codes, settings, organizer_contact, \
     created_at, updated_at FROM events";

#[async_trait]
impl EventStore for PgEventStore {
    async fn insert(&self, event: &Event) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO events (id, owner_id, name, description, genre, tags, location, \
             files, schedule, ticket_tiers, discount_codes, settings, organizer_contact, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(event.id)
        .bind(event.owner_id)
        .bind(&event.name)
        .bind(&event.description)
        .bind(&event.genre)
        .bind(Json(&event.tags))
        .bind(Json(&event.location))
        .bind(Json(&event.files))
        .bind(Json(&event.schedule))
        .bind(Json(&event.ticket_tiers))
        .bind(Json(&event.discount_codes))
        .bind(Json(&event.settings))
        .bind(Json(&event.organizer_contact))
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, event: &Event) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE events SET name = $2, description = $3, genre = $4, tags = $5, \
             location = $6, files = $7, schedule = $8, ticket_tiers = $9, \
             discount_codes = $10, settings = $11, organizer_contact = $12, \
             updated_at = $13 WHERE id = $1",
        )
        .bind(event.id)
        .bind(&event.name)
        .bind(&event.description)
        .bind(&event.genre)
        .bind(Json(&event.tags))
        .bind(Json(&event.location))
        .bind(Json(&event.files))
        .bind(Json(&event.schedule))
        .bind(Json(&event.ticket_tiers))
        .bind(Json(&event.discount_codes))
        .bind(Json(&event.settings))
        .bind(Json(&event.organizer_contact))
        .bind(event.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(&format!("{SELECT_EVENT} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Event::from))
    }

    async fn list_public(&self) -> AppResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "{SELECT_EVENT} WHERE settings->>'publish_status' = 'published' \
             AND settings->>'visibility' = 'public' ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> AppResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "{SELECT_EVENT} WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn find_by_invitation_token(&self, token: &str) -> AppResult<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "{SELECT_EVENT} WHERE settings->>'invitation_token' = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Event::from))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
