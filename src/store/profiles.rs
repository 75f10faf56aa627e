use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{NewProfile, ProfileStore, ProfileUpdate};
use crate::models::{Role, SellerInfo, UserProfile};
use crate::utils::error::{AppError, AppResult};

pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ProfileRow {
    id: Uuid,
    firebase_uid: String,
    email: String,
    display_name: Option<String>,
    role: String,
    profile_picture: Option<String>,
    is_active: bool,
    last_login: Option<DateTime<Utc>>,
    seller_info: Option<Json<SellerInfo>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for UserProfile {
    type Error = AppError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e: String| AppError::Internal(e))?;
        Ok(UserProfile {
            id: row.id,
            firebase_uid: row.firebase_uid,
            email: row.email,
            display_name: row.display_name,
            role,
            profile_picture: row.profile_picture,
            is_active: row.is_active,
            last_login: row.last_login,
            seller_info: row.seller_info.map(|info| info.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_PROFILE: &str = "SELECT id, firebase_uid, email, display_name, role, \
     profile_picture, is_active, last_login, seller_info, created_at, updated_at FROM profiles";

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn find_by_uid(&self, uid: &str) -> AppResult<Option<UserProfile>> {
        let row =
            sqlx::query_as::<_, ProfileRow>(&format!("{SELECT_PROFILE} WHERE firebase_uid = $1"))
                .bind(uid)
                .fetch_optional(&self.pool)
                .await?;
        row.map(UserProfile::try_from).transpose()
    }

    async fn create(&self, new_profile: NewProfile) -> AppResult<UserProfile> {
        let now = Utc::now();
        let result = sqlx::query_as::<_, ProfileRow>(
            "INSERT INTO profiles (id, firebase_uid, email, display_name, role, \
             profile_picture, is_active, last_login, seller_info, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $8, $7, $7) \
             RETURNING id, firebase_uid, email, display_name, role, profile_picture, \
             is_active, last_login, seller_info, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(&new_profile.firebase_uid)
        .bind(&new_profile.email)
        .bind(&new_profile.display_name)
        .bind(new_profile.role.as_str())
        .bind(&new_profile.profile_picture)
        .bind(now)
        .bind(new_profile.seller_info.as_ref().map(Json))
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => row.try_into(),
            // Another writer won the unique-key race; their profile is the
            // profile.
            Err(e) if is_unique_violation(&e) => self
                .find_by_uid(&new_profile.firebase_uid)
                .await?
                .ok_or_else(|| AppError::Database(e)),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, uid: &str, update: ProfileUpdate) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "UPDATE profiles SET email = COALESCE($2, email), \
             display_name = COALESCE($3, display_name), \
             profile_picture = COALESCE($4, profile_picture), \
             seller_info = COALESCE($5, seller_info), updated_at = $6 \
             WHERE firebase_uid = $1 \
             RETURNING id, firebase_uid, email, display_name, role, profile_picture, \
             is_active, last_login, seller_info, created_at, updated_at",
        )
        .bind(uid)
        .bind(&update.email)
        .bind(&update.display_name)
        .bind(&update.profile_picture)
        .bind(update.seller_info.as_ref().map(Json))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserProfile::try_from).transpose()
    }

    async fn upgrade_to_seller(
        &self,
        uid: &str,
        info: SellerInfo,
    ) -> AppResult<Option<UserProfile>> {
        // Admins keep their role; everyone else becomes a seller.
        let row = sqlx::query_as::<_, ProfileRow>(
            "UPDATE profiles SET role = CASE WHEN role = 'admin' THEN 'admin' ELSE 'seller' END, \
             seller_info = $2, updated_at = $3 WHERE firebase_uid = $1 \
             RETURNING id, firebase_uid, email, display_name, role, profile_picture, \
             is_active, last_login, seller_info, created_at, updated_at",
        )
        .bind(uid)
        .bind(Json(&info))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserProfile::try_from).transpose()
    }

    async fn touch_login(&self, uid: &str) -> AppResult<()> {
        sqlx::query("UPDATE profiles SET last_login = $2 WHERE firebase_uid = $1")
            .bind(uid)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
