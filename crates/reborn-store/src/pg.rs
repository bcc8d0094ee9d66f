//! PostgreSQL storage implementation.
//!
//! All access goes through parameterized queries on a shared `PgPool`.
//! Enum-ish columns (statuses, categories) are stored as text labels and
//! parsed back through the core `FromStr` impls.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use reborn_core::{
    rating, AccountStatus, Jjim, JjimId, Listing, ListingId, ListingStatus, RebornTask, Review,
    ReviewId, Store, StoreCategory, StoreId, TaskId, TaskStatus, User, UserId,
};

use crate::error::{Result, StoreError};
use crate::types::{
    HistoryDetailRow, HistoryRow, JjimRow, ListingUpdate, NewListing, NewReview, NewStore, NewUser,
    ReviewRow, StoreProfileUpdate, StoreSort, TaskRow, UserProfileUpdate,
};
use crate::Database;

/// PostgreSQL-backed implementation of the [`Database`] trait.
#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    /// Connect to PostgreSQL with a bounded pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool (used by tests that manage their own pool).
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails to apply.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Access the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn recompute_score_inner(&self, store_id: StoreId) -> Result<()> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM stores WHERE id = $1)")
                .bind(store_id.as_i64())
                .fetch_one(&self.pool)
                .await?;
        if !exists {
            return Err(StoreError::not_found("store", store_id));
        }

        let avg: Option<f64> = sqlx::query_scalar(
            "SELECT AVG(r.score)::float8 \
             FROM reviews r JOIN listings l ON r.listing_id = l.id \
             WHERE l.store_id = $1",
        )
        .bind(store_id.as_i64())
        .fetch_one(&self.pool)
        .await?;

        // Zero reviews: leave the previous score unchanged.
        let Some(avg) = avg else {
            tracing::debug!(store_id = %store_id, "no reviews; score left unchanged");
            return Ok(());
        };

        let score = rating::round_score(avg);
        sqlx::query("UPDATE stores SET score = $1 WHERE id = $2")
            .bind(score)
            .bind(store_id.as_i64())
            .execute(&self.pool)
            .await?;

        tracing::debug!(store_id = %store_id, score, "store score recomputed");
        Ok(())
    }
}

// =============================================================================
// Row types
// =============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    login_id: String,
    email: String,
    password_hash: String,
    nickname: String,
    address: String,
    likes: String,
    birth_date: Option<String>,
    image_url: Option<String>,
    point: i64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(Self {
            id: UserId::new(row.id),
            login_id: row.login_id,
            email: row.email,
            password_hash: row.password_hash,
            nickname: row.nickname,
            address: row.address,
            likes: parse_label(&row.likes)?,
            birth_date: row.birth_date,
            image_url: row.image_url,
            point: row.point,
            status: parse_label(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StoreRow {
    id: i64,
    owner_id: i64,
    name: String,
    registration_number: String,
    address: String,
    image_url: Option<String>,
    category: String,
    score: f64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StoreRow> for Store {
    type Error = StoreError;

    fn try_from(row: StoreRow) -> Result<Self> {
        Ok(Self {
            id: StoreId::new(row.id),
            owner_id: UserId::new(row.owner_id),
            name: row.name,
            registration_number: row.registration_number,
            address: row.address,
            image_url: row.image_url,
            category: parse_label(&row.category)?,
            score: row.score,
            status: parse_label(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ListingRow {
    id: i64,
    store_id: i64,
    product_name: String,
    product_guide: String,
    product_comment: String,
    image_url: Option<String>,
    available_count: i32,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ListingRow> for Listing {
    type Error = StoreError;

    fn try_from(row: ListingRow) -> Result<Self> {
        Ok(Self {
            id: ListingId::new(row.id),
            store_id: StoreId::new(row.store_id),
            product_name: row.product_name,
            product_guide: row.product_guide,
            product_comment: row.product_comment,
            image_url: row.image_url,
            available_count: row.available_count,
            status: parse_label(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TaskRecRow {
    id: i64,
    listing_id: i64,
    user_id: i64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRecRow> for RebornTask {
    type Error = StoreError;

    fn try_from(row: TaskRecRow) -> Result<Self> {
        Ok(Self {
            id: TaskId::new(row.id),
            listing_id: ListingId::new(row.listing_id),
            user_id: UserId::new(row.user_id),
            status: parse_label(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRecRow {
    id: i64,
    user_id: i64,
    listing_id: i64,
    score: i32,
    comment: String,
    image_urls: Vec<String>,
    created_at: DateTime<Utc>,
}

impl From<ReviewRecRow> for Review {
    fn from(row: ReviewRecRow) -> Self {
        Self {
            id: ReviewId::new(row.id),
            user_id: UserId::new(row.user_id),
            listing_id: ListingId::new(row.listing_id),
            score: row.score,
            comment: row.comment,
            image_urls: row.image_urls,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewJoinRow {
    review_id: i64,
    user_id: i64,
    user_image_url: Option<String>,
    user_nickname: String,
    store_name: String,
    store_category: String,
    listing_id: i64,
    product_name: String,
    score: i32,
    comment: String,
    image_urls: Vec<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewJoinRow> for ReviewRow {
    type Error = StoreError;

    fn try_from(row: ReviewJoinRow) -> Result<Self> {
        Ok(Self {
            review_id: ReviewId::new(row.review_id),
            user_id: UserId::new(row.user_id),
            user_image_url: row.user_image_url,
            user_nickname: row.user_nickname,
            store_name: row.store_name,
            store_category: parse_label(&row.store_category)?,
            listing_id: ListingId::new(row.listing_id),
            product_name: row.product_name,
            score: row.score,
            comment: row.comment,
            image_urls: row.image_urls,
            created_at: row.created_at,
        })
    }
}

fn parse_label<T>(value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| StoreError::Database(e.to_string()))
}

const REVIEW_JOIN_SELECT: &str = "SELECT r.id AS review_id, r.user_id, \
     u.image_url AS user_image_url, u.nickname AS user_nickname, \
     s.name AS store_name, s.category AS store_category, \
     r.listing_id, l.product_name, r.score, r.comment, r.image_urls, r.created_at \
     FROM reviews r \
     JOIN listings l ON r.listing_id = l.id \
     JOIN users u ON r.user_id = u.id \
     JOIN stores s ON l.store_id = s.id";

const STORE_SELECT: &str = "SELECT id, owner_id, name, registration_number, address, \
     image_url, category, score, status, created_at, updated_at FROM stores";

const LISTING_SELECT: &str = "SELECT id, store_id, product_name, product_guide, \
     product_comment, image_url, available_count, status, created_at, updated_at FROM listings";

const USER_SELECT: &str = "SELECT id, login_id, email, password_hash, nickname, address, \
     likes, birth_date, image_url, point, status, created_at, updated_at FROM users";

// =============================================================================
// Trait implementation
// =============================================================================

#[async_trait]
impl Database for PgDatabase {
    // =========================================================================
    // User Operations
    // =========================================================================

    async fn create_user(&self, new: NewUser) -> Result<User> {
        let row: UserRow = sqlx::query_as(
            "INSERT INTO users (login_id, email, password_hash, nickname, address, likes, \
             birth_date, image_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING id, login_id, email, password_hash, nickname, address, likes, \
             birth_date, image_url, point, status, created_at, updated_at",
        )
        .bind(&new.login_id)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.nickname)
        .bind(&new.address)
        .bind(new.likes.as_str())
        .bind(&new.birth_date)
        .bind(&new.image_url)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn create_store_account(
        &self,
        new_user: NewUser,
        new_store: NewStore,
    ) -> Result<(User, Store)> {
        let mut tx = self.pool.begin().await?;

        let user_row: UserRow = sqlx::query_as(
            "INSERT INTO users (login_id, email, password_hash, nickname, address, likes, \
             birth_date, image_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING id, login_id, email, password_hash, nickname, address, likes, \
             birth_date, image_url, point, status, created_at, updated_at",
        )
        .bind(&new_user.login_id)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.nickname)
        .bind(&new_user.address)
        .bind(new_user.likes.as_str())
        .bind(&new_user.birth_date)
        .bind(&new_user.image_url)
        .fetch_one(&mut *tx)
        .await?;

        let store_row: StoreRow = sqlx::query_as(
            "INSERT INTO stores (owner_id, name, registration_number, address, image_url, \
             category) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, owner_id, name, registration_number, address, image_url, category, \
             score, status, created_at, updated_at",
        )
        .bind(user_row.id)
        .bind(&new_store.name)
        .bind(&new_store.registration_number)
        .bind(&new_store.address)
        .bind(&new_store.image_url)
        .bind(new_store.category.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((user_row.try_into()?, store_row.try_into()?))
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("{USER_SELECT} WHERE id = $1"))
                .bind(id.as_i64())
                .fetch_optional(&self.pool)
                .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn get_user_by_login_id(&self, login_id: &str) -> Result<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("{USER_SELECT} WHERE login_id = $1"))
                .bind(login_id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn login_id_exists(&self, login_id: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE login_id = $1)")
                .bind(login_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn update_user_profile(&self, id: UserId, update: UserProfileUpdate) -> Result<()> {
        let result = sqlx::query(
            "UPDATE users SET nickname = $1, address = $2, likes = $3, \
             image_url = COALESCE($4, image_url), updated_at = now() WHERE id = $5",
        )
        .bind(&update.nickname)
        .bind(&update.address)
        .bind(update.likes.as_str())
        .bind(&update.image_url)
        .bind(id.as_i64())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("user", id));
        }
        Ok(())
    }

    async fn update_user_password(&self, id: UserId, password_hash: &str) -> Result<()> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2")
                .bind(password_hash)
                .bind(id.as_i64())
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("user", id));
        }
        Ok(())
    }

    async fn adjust_user_point(&self, id: UserId, delta: i64) -> Result<i64> {
        let point: Option<i64> = sqlx::query_scalar(
            "UPDATE users SET point = point + $1, updated_at = now() WHERE id = $2 \
             RETURNING point",
        )
        .bind(delta)
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;
        point.ok_or_else(|| StoreError::not_found("user", id))
    }

    async fn set_user_status(&self, id: UserId, status: AccountStatus) -> Result<()> {
        let result = sqlx::query("UPDATE users SET status = $1, updated_at = now() WHERE id = $2")
            .bind(status.as_str())
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("user", id));
        }
        Ok(())
    }

    // =========================================================================
    // Store Operations
    // =========================================================================

    async fn get_store(&self, id: StoreId) -> Result<Option<Store>> {
        let row: Option<StoreRow> =
            sqlx::query_as(&format!("{STORE_SELECT} WHERE id = $1"))
                .bind(id.as_i64())
                .fetch_optional(&self.pool)
                .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn get_store_by_owner(&self, owner_id: UserId) -> Result<Option<Store>> {
        let row: Option<StoreRow> =
            sqlx::query_as(&format!("{STORE_SELECT} WHERE owner_id = $1"))
                .bind(owner_id.as_i64())
                .fetch_optional(&self.pool)
                .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn list_stores(&self) -> Result<Vec<Store>> {
        let rows: Vec<StoreRow> = sqlx::query_as(&format!(
            "{STORE_SELECT} WHERE status = 'active' ORDER BY updated_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_new_stores(&self, limit: i64) -> Result<Vec<Store>> {
        let rows: Vec<StoreRow> = sqlx::query_as(&format!(
            "{STORE_SELECT} WHERE status = 'active' ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_popular_stores(
        &self,
        category: StoreCategory,
        limit: i64,
    ) -> Result<Vec<Store>> {
        let rows: Vec<StoreRow> = sqlx::query_as(&format!(
            "{STORE_SELECT} WHERE status = 'active' AND category = $1 \
             ORDER BY score DESC LIMIT $2"
        ))
        .bind(category.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn search_stores(&self, keyword: &str, sort: StoreSort) -> Result<Vec<Store>> {
        let order_by = match sort {
            StoreSort::Name => "s.name ASC",
            StoreSort::Score => "s.score DESC",
            StoreSort::Jjim => {
                "(SELECT COUNT(*) FROM jjims j JOIN listings l ON j.listing_id = l.id \
                 WHERE l.store_id = s.id) DESC"
            }
        };
        let rows: Vec<StoreRow> = sqlx::query_as(&format!(
            "SELECT s.id, s.owner_id, s.name, s.registration_number, s.address, s.image_url, \
             s.category, s.score, s.status, s.created_at, s.updated_at \
             FROM stores s \
             WHERE s.status = 'active' AND s.name ILIKE '%' || $1 || '%' \
             ORDER BY {order_by}"
        ))
        .bind(keyword)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_store_profile(&self, id: StoreId, update: StoreProfileUpdate) -> Result<()> {
        let result = sqlx::query(
            "UPDATE stores SET name = $1, address = $2, category = $3, \
             image_url = COALESCE($4, image_url), updated_at = now() WHERE id = $5",
        )
        .bind(&update.name)
        .bind(&update.address)
        .bind(update.category.as_str())
        .bind(&update.image_url)
        .bind(id.as_i64())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("store", id));
        }
        Ok(())
    }

    async fn set_store_status_by_owner(
        &self,
        owner_id: UserId,
        status: AccountStatus,
    ) -> Result<()> {
        let result =
            sqlx::query("UPDATE stores SET status = $1, updated_at = now() WHERE owner_id = $2")
                .bind(status.as_str())
                .bind(owner_id.as_i64())
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("store owned by user", owner_id));
        }
        Ok(())
    }

    async fn count_store_jjims(&self, store_id: StoreId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM jjims j JOIN listings l ON j.listing_id = l.id \
             WHERE l.store_id = $1",
        )
        .bind(store_id.as_i64())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    // =========================================================================
    // Listing Operations
    // =========================================================================

    async fn create_listing(&self, new: NewListing) -> Result<Listing> {
        let row: Option<ListingRow> = sqlx::query_as(
            "INSERT INTO listings (store_id, product_name, product_guide, product_comment, \
             image_url, available_count) \
             SELECT $1, $2, $3, $4, $5, $6 WHERE EXISTS (SELECT 1 FROM stores WHERE id = $1) \
             RETURNING id, store_id, product_name, product_guide, product_comment, image_url, \
             available_count, status, created_at, updated_at",
        )
        .bind(new.store_id.as_i64())
        .bind(&new.product_name)
        .bind(&new.product_guide)
        .bind(&new.product_comment)
        .bind(&new.image_url)
        .bind(new.available_count)
        .fetch_optional(&self.pool)
        .await?;
        row.map_or_else(
            || Err(StoreError::not_found("store", new.store_id)),
            TryInto::try_into,
        )
    }

    async fn get_listing(&self, id: ListingId) -> Result<Option<Listing>> {
        let row: Option<ListingRow> =
            sqlx::query_as(&format!("{LISTING_SELECT} WHERE id = $1"))
                .bind(id.as_i64())
                .fetch_optional(&self.pool)
                .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn list_store_listings(
        &self,
        store_id: StoreId,
        status: ListingStatus,
    ) -> Result<Vec<Listing>> {
        let rows: Vec<ListingRow> = sqlx::query_as(&format!(
            "{LISTING_SELECT} WHERE store_id = $1 AND status = $2 ORDER BY created_at DESC"
        ))
        .bind(store_id.as_i64())
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_listing(&self, id: ListingId, update: ListingUpdate) -> Result<()> {
        let result = sqlx::query(
            "UPDATE listings SET product_name = $1, product_guide = $2, product_comment = $3, \
             available_count = $4, image_url = COALESCE($5, image_url), updated_at = now() \
             WHERE id = $6",
        )
        .bind(&update.product_name)
        .bind(&update.product_guide)
        .bind(&update.product_comment)
        .bind(update.available_count)
        .bind(&update.image_url)
        .bind(id.as_i64())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("listing", id));
        }
        Ok(())
    }

    async fn set_listing_status(&self, id: ListingId, status: ListingStatus) -> Result<()> {
        let result =
            sqlx::query("UPDATE listings SET status = $1, updated_at = now() WHERE id = $2")
                .bind(status.as_str())
                .bind(id.as_i64())
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("listing", id));
        }
        Ok(())
    }

    // =========================================================================
    // Task Operations
    // =========================================================================

    async fn create_task(&self, listing_id: ListingId, user_id: UserId) -> Result<RebornTask> {
        let mut tx = self.pool.begin().await?;

        let listing: Option<ListingRow> = sqlx::query_as(&format!(
            "{LISTING_SELECT} WHERE id = $1 FOR UPDATE"
        ))
        .bind(listing_id.as_i64())
        .fetch_optional(&mut *tx)
        .await?;
        let listing: Listing = listing
            .ok_or_else(|| StoreError::not_found("listing", listing_id))?
            .try_into()?;
        if !listing.is_claimable() {
            return Err(StoreError::Conflict(format!(
                "listing {listing_id} is not claimable"
            )));
        }

        let remaining = listing.available_count - 1;
        let new_status = if remaining == 0 {
            ListingStatus::SoldOut
        } else {
            listing.status
        };
        sqlx::query(
            "UPDATE listings SET available_count = $1, status = $2, updated_at = now() \
             WHERE id = $3",
        )
        .bind(remaining)
        .bind(new_status.as_str())
        .bind(listing_id.as_i64())
        .execute(&mut *tx)
        .await?;

        let row: TaskRecRow = sqlx::query_as(
            "INSERT INTO reborn_tasks (listing_id, user_id) VALUES ($1, $2) \
             RETURNING id, listing_id, user_id, status, created_at, updated_at",
        )
        .bind(listing_id.as_i64())
        .bind(user_id.as_i64())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    async fn get_task(&self, id: TaskId) -> Result<Option<RebornTask>> {
        let row: Option<TaskRecRow> = sqlx::query_as(
            "SELECT id, listing_id, user_id, status, created_at, updated_at \
             FROM reborn_tasks WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn set_task_status(&self, id: TaskId, status: TaskStatus) -> Result<()> {
        let result =
            sqlx::query("UPDATE reborn_tasks SET status = $1, updated_at = now() WHERE id = $2")
                .bind(status.as_str())
                .bind(id.as_i64())
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("task", id));
        }
        Ok(())
    }

    async fn list_in_progress(&self, user_id: UserId) -> Result<Vec<TaskRow>> {
        #[derive(sqlx::FromRow)]
        struct Row {
            task_id: i64,
            listing_id: i64,
            product_name: String,
            product_image_url: Option<String>,
            store_id: i64,
            store_name: String,
            store_address: String,
            status: String,
            created_at: DateTime<Utc>,
        }

        let rows: Vec<Row> = sqlx::query_as(
            "SELECT t.id AS task_id, t.listing_id, l.product_name, \
             l.image_url AS product_image_url, s.id AS store_id, s.name AS store_name, \
             s.address AS store_address, t.status, t.created_at \
             FROM reborn_tasks t \
             JOIN listings l ON t.listing_id = l.id \
             JOIN stores s ON l.store_id = s.id \
             WHERE t.user_id = $1 AND t.status = 'active' \
             ORDER BY t.created_at DESC",
        )
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(TaskRow {
                    task_id: TaskId::new(row.task_id),
                    listing_id: ListingId::new(row.listing_id),
                    product_name: row.product_name,
                    product_image_url: row.product_image_url,
                    store_id: StoreId::new(row.store_id),
                    store_name: row.store_name,
                    store_address: row.store_address,
                    status: parse_label(&row.status)?,
                    created_at: row.created_at,
                })
            })
            .collect()
    }

    async fn list_history(&self, user_id: UserId) -> Result<Vec<HistoryRow>> {
        #[derive(sqlx::FromRow)]
        struct Row {
            task_id: i64,
            store_name: String,
            store_score: f64,
            store_address: String,
            completed_at: DateTime<Utc>,
        }

        let rows: Vec<Row> = sqlx::query_as(
            "SELECT t.id AS task_id, s.name AS store_name, s.score AS store_score, \
             s.address AS store_address, t.updated_at AS completed_at \
             FROM reborn_tasks t \
             JOIN listings l ON t.listing_id = l.id \
             JOIN stores s ON l.store_id = s.id \
             WHERE t.user_id = $1 AND t.status = 'complete' \
             ORDER BY t.updated_at DESC",
        )
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| HistoryRow {
                task_id: TaskId::new(row.task_id),
                store_name: row.store_name,
                store_score: row.store_score,
                store_address: row.store_address,
                completed_at: row.completed_at,
            })
            .collect())
    }

    async fn get_history_detail(&self, task_id: TaskId) -> Result<Option<HistoryDetailRow>> {
        #[derive(sqlx::FromRow)]
        struct Row {
            task_id: i64,
            product_name: String,
            product_guide: String,
            product_comment: String,
            product_image_url: Option<String>,
            store_name: String,
            store_address: String,
            status: String,
            created_at: DateTime<Utc>,
            updated_at: DateTime<Utc>,
        }

        let row: Option<Row> = sqlx::query_as(
            "SELECT t.id AS task_id, l.product_name, l.product_guide, l.product_comment, \
             l.image_url AS product_image_url, s.name AS store_name, \
             s.address AS store_address, t.status, t.created_at, t.updated_at \
             FROM reborn_tasks t \
             JOIN listings l ON t.listing_id = l.id \
             JOIN stores s ON l.store_id = s.id \
             WHERE t.id = $1",
        )
        .bind(task_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(HistoryDetailRow {
                task_id: TaskId::new(row.task_id),
                product_name: row.product_name,
                product_guide: row.product_guide,
                product_comment: row.product_comment,
                product_image_url: row.product_image_url,
                store_name: row.store_name,
                store_address: row.store_address,
                status: parse_label(&row.status)?,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
        })
        .transpose()
    }

    async fn find_completed_task(
        &self,
        listing_id: ListingId,
        user_id: UserId,
    ) -> Result<Option<RebornTask>> {
        let row: Option<TaskRecRow> = sqlx::query_as(
            "SELECT id, listing_id, user_id, status, created_at, updated_at \
             FROM reborn_tasks \
             WHERE listing_id = $1 AND user_id = $2 AND status = 'complete' \
             ORDER BY updated_at DESC LIMIT 1",
        )
        .bind(listing_id.as_i64())
        .bind(user_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;
        row.map(TryInto::try_into).transpose()
    }

    // =========================================================================
    // Review Operations
    // =========================================================================

    async fn create_review(&self, new: NewReview) -> Result<Review> {
        let row: Option<ReviewRecRow> = sqlx::query_as(
            "INSERT INTO reviews (user_id, listing_id, score, comment, image_urls) \
             SELECT $1, $2, $3, $4, $5 WHERE EXISTS (SELECT 1 FROM listings WHERE id = $2) \
             RETURNING id, user_id, listing_id, score, comment, image_urls, created_at",
        )
        .bind(new.user_id.as_i64())
        .bind(new.listing_id.as_i64())
        .bind(new.score)
        .bind(&new.comment)
        .bind(&new.image_urls)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Review::from)
            .ok_or_else(|| StoreError::not_found("listing", new.listing_id))
    }

    async fn get_review_record(&self, id: ReviewId) -> Result<Option<Review>> {
        let row: Option<ReviewRecRow> = sqlx::query_as(
            "SELECT id, user_id, listing_id, score, comment, image_urls, created_at \
             FROM reviews WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Review::from))
    }

    async fn get_review(&self, id: ReviewId) -> Result<Option<ReviewRow>> {
        let row: Option<ReviewJoinRow> =
            sqlx::query_as(&format!("{REVIEW_JOIN_SELECT} WHERE r.id = $1"))
                .bind(id.as_i64())
                .fetch_optional(&self.pool)
                .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn delete_review(&self, id: ReviewId) -> Result<()> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("review", id));
        }
        Ok(())
    }

    async fn list_store_reviews(&self, store_id: StoreId) -> Result<Vec<ReviewRow>> {
        let rows: Vec<ReviewJoinRow> = sqlx::query_as(&format!(
            "{REVIEW_JOIN_SELECT} WHERE l.store_id = $1 ORDER BY r.created_at DESC"
        ))
        .bind(store_id.as_i64())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_user_reviews(&self, user_id: UserId) -> Result<Vec<ReviewRow>> {
        let rows: Vec<ReviewJoinRow> = sqlx::query_as(&format!(
            "{REVIEW_JOIN_SELECT} WHERE r.user_id = $1 ORDER BY r.created_at DESC"
        ))
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn best_reviews(&self, limit: i64) -> Result<Vec<ReviewRow>> {
        let rows: Vec<ReviewJoinRow> = sqlx::query_as(&format!(
            "{REVIEW_JOIN_SELECT} ORDER BY r.score DESC, r.created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn count_store_reviews(&self, store_id: StoreId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reviews r JOIN listings l ON r.listing_id = l.id \
             WHERE l.store_id = $1",
        )
        .bind(store_id.as_i64())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    // =========================================================================
    // Score Aggregation
    // =========================================================================

    async fn recompute_store_score(&self, store_id: StoreId) -> Result<()> {
        self.recompute_score_inner(store_id).await
    }

    async fn recompute_store_score_by_listing(&self, listing_id: ListingId) -> Result<()> {
        let store_id: Option<i64> =
            sqlx::query_scalar("SELECT store_id FROM listings WHERE id = $1")
                .bind(listing_id.as_i64())
                .fetch_optional(&self.pool)
                .await?;
        let store_id =
            store_id.ok_or_else(|| StoreError::not_found("listing", listing_id))?;
        self.recompute_score_inner(StoreId::new(store_id)).await
    }

    async fn recompute_all_store_scores(&self) -> Result<usize> {
        let store_ids: Vec<i64> = sqlx::query_scalar(
            "SELECT DISTINCT l.store_id FROM reviews r \
             JOIN listings l ON r.listing_id = l.id \
             ORDER BY l.store_id",
        )
        .fetch_all(&self.pool)
        .await?;

        // Each store is updated independently; a failure partway leaves the
        // stores already processed at their new scores.
        let mut updated = 0;
        for id in store_ids {
            self.recompute_score_inner(StoreId::new(id)).await?;
            updated += 1;
        }
        Ok(updated)
    }

    // =========================================================================
    // Jjim Operations
    // =========================================================================

    async fn create_jjim(&self, user_id: UserId, listing_id: ListingId) -> Result<Jjim> {
        #[derive(sqlx::FromRow)]
        struct Row {
            id: i64,
            user_id: i64,
            listing_id: i64,
            created_at: DateTime<Utc>,
        }

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM listings WHERE id = $1)")
                .bind(listing_id.as_i64())
                .fetch_one(&self.pool)
                .await?;
        if !exists {
            return Err(StoreError::not_found("listing", listing_id));
        }

        let row: Row = sqlx::query_as(
            "INSERT INTO jjims (user_id, listing_id) VALUES ($1, $2) \
             RETURNING id, user_id, listing_id, created_at",
        )
        .bind(user_id.as_i64())
        .bind(listing_id.as_i64())
        .fetch_one(&self.pool)
        .await?;

        Ok(Jjim {
            id: JjimId::new(row.id),
            user_id: UserId::new(row.user_id),
            listing_id: ListingId::new(row.listing_id),
            created_at: row.created_at,
        })
    }

    async fn delete_jjim(&self, user_id: UserId, listing_id: ListingId) -> Result<()> {
        let result = sqlx::query("DELETE FROM jjims WHERE user_id = $1 AND listing_id = $2")
            .bind(user_id.as_i64())
            .bind(listing_id.as_i64())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("jjim for listing", listing_id));
        }
        Ok(())
    }

    async fn list_user_jjims(&self, user_id: UserId) -> Result<Vec<JjimRow>> {
        #[derive(sqlx::FromRow)]
        struct Row {
            jjim_id: i64,
            listing_id: i64,
            product_name: String,
            product_image_url: Option<String>,
            listing_status: String,
            store_id: i64,
            store_name: String,
            created_at: DateTime<Utc>,
        }

        let rows: Vec<Row> = sqlx::query_as(
            "SELECT j.id AS jjim_id, j.listing_id, l.product_name, \
             l.image_url AS product_image_url, l.status AS listing_status, \
             s.id AS store_id, s.name AS store_name, j.created_at \
             FROM jjims j \
             JOIN listings l ON j.listing_id = l.id \
             JOIN stores s ON l.store_id = s.id \
             WHERE j.user_id = $1 \
             ORDER BY j.created_at DESC",
        )
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(JjimRow {
                    jjim_id: JjimId::new(row.jjim_id),
                    listing_id: ListingId::new(row.listing_id),
                    product_name: row.product_name,
                    product_image_url: row.product_image_url,
                    listing_status: parse_label(&row.listing_status)?,
                    store_id: StoreId::new(row.store_id),
                    store_name: row.store_name,
                    created_at: row.created_at,
                })
            })
            .collect()
    }
}
