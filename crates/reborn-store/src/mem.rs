//! In-memory storage implementation.
//!
//! Backs unit and integration tests. Tables are `BTreeMap`s behind a single
//! `RwLock`; ids are assigned from per-table counters the same way the SQL
//! backend's sequences do. The lock is never held across an await point.

use std::collections::{BTreeMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use reborn_core::{
    rating, AccountStatus, Jjim, Listing, ListingId, ListingStatus, RebornTask, Review, ReviewId,
    Store, StoreCategory, StoreId, TaskId, TaskStatus, User, UserId,
};

use crate::error::{Result, StoreError};
use crate::types::{
    HistoryDetailRow, HistoryRow, JjimRow, ListingUpdate, NewListing, NewReview, NewStore, NewUser,
    ReviewRow, StoreProfileUpdate, StoreSort, TaskRow, UserProfileUpdate,
};
use crate::Database;

#[derive(Default)]
struct Inner {
    users: BTreeMap<i64, User>,
    stores: BTreeMap<i64, Store>,
    listings: BTreeMap<i64, Listing>,
    tasks: BTreeMap<i64, RebornTask>,
    reviews: BTreeMap<i64, Review>,
    jjims: BTreeMap<i64, Jjim>,
    next_user: i64,
    next_store: i64,
    next_listing: i64,
    next_task: i64,
    next_review: i64,
    next_jjim: i64,
    /// Store ids whose score update is forced to fail. Test hook for the
    /// partial-application behavior of the bulk recompute.
    poisoned_scores: HashSet<i64>,
}

impl Inner {
    fn next(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }

    /// All review scores belonging to a store, joined through its listings.
    fn store_review_scores(&self, store_id: StoreId) -> Vec<i32> {
        self.reviews
            .values()
            .filter(|r| {
                self.listings
                    .get(&r.listing_id.as_i64())
                    .is_some_and(|l| l.store_id == store_id)
            })
            .map(|r| r.score)
            .collect()
    }

    fn recompute_store_score(&mut self, store_id: StoreId) -> Result<()> {
        if !self.stores.contains_key(&store_id.as_i64()) {
            return Err(StoreError::not_found("store", store_id));
        }
        if self.poisoned_scores.contains(&store_id.as_i64()) {
            return Err(StoreError::Database(format!(
                "injected failure updating store {store_id}"
            )));
        }
        let scores = self.store_review_scores(store_id);
        // Zero reviews: leave the previous score unchanged.
        if let Some(score) = rating::aggregate_score(&scores) {
            if let Some(store) = self.stores.get_mut(&store_id.as_i64()) {
                store.score = score;
            }
        }
        Ok(())
    }

    fn review_row(&self, review: &Review) -> Option<ReviewRow> {
        let user = self.users.get(&review.user_id.as_i64())?;
        let listing = self.listings.get(&review.listing_id.as_i64())?;
        let store = self.stores.get(&listing.store_id.as_i64())?;
        Some(ReviewRow {
            review_id: review.id,
            user_id: review.user_id,
            user_image_url: user.image_url.clone(),
            user_nickname: user.nickname.clone(),
            store_name: store.name.clone(),
            store_category: store.category,
            listing_id: review.listing_id,
            product_name: listing.product_name.clone(),
            score: review.score,
            comment: review.comment.clone(),
            image_urls: review.image_urls.clone(),
            created_at: review.created_at,
        })
    }

    fn count_store_jjims(&self, store_id: StoreId) -> i64 {
        self.jjims
            .values()
            .filter(|j| {
                self.listings
                    .get(&j.listing_id.as_i64())
                    .is_some_and(|l| l.store_id == store_id)
            })
            .count() as i64
    }
}

/// In-memory implementation of the [`Database`] trait.
#[derive(Default)]
pub struct MemDatabase {
    inner: RwLock<Inner>,
}

impl MemDatabase {
    /// Create an empty in-memory database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Force every future score update for `store_id` to fail.
    ///
    /// Test hook: exercises the partial-application failure policy of the
    /// bulk recompute.
    pub fn poison_score_update(&self, store_id: StoreId) {
        self.inner
            .write()
            .expect("lock poisoned")
            .poisoned_scores
            .insert(store_id.as_i64());
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().expect("lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().expect("lock poisoned")
    }
}

#[async_trait]
impl Database for MemDatabase {
    // =========================================================================
    // User Operations
    // =========================================================================

    async fn create_user(&self, new: NewUser) -> Result<User> {
        let mut inner = self.write();
        if inner.users.values().any(|u| u.login_id == new.login_id) {
            return Err(StoreError::Conflict(format!(
                "login id taken: {}",
                new.login_id
            )));
        }
        if inner.users.values().any(|u| u.email == new.email) {
            return Err(StoreError::Conflict(format!("email taken: {}", new.email)));
        }
        let now = Utc::now();
        let id = Inner::next(&mut inner.next_user);
        let user = User {
            id: UserId::new(id),
            login_id: new.login_id,
            email: new.email,
            password_hash: new.password_hash,
            nickname: new.nickname,
            address: new.address,
            likes: new.likes,
            birth_date: new.birth_date,
            image_url: new.image_url,
            point: 0,
            status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(id, user.clone());
        Ok(user)
    }

    async fn create_store_account(
        &self,
        new_user: NewUser,
        new_store: NewStore,
    ) -> Result<(User, Store)> {
        let user = self.create_user(new_user).await?;
        let mut inner = self.write();
        let now = Utc::now();
        let id = Inner::next(&mut inner.next_store);
        let store = Store {
            id: StoreId::new(id),
            owner_id: user.id,
            name: new_store.name,
            registration_number: new_store.registration_number,
            address: new_store.address,
            image_url: new_store.image_url,
            category: new_store.category,
            score: 0.0,
            status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
        };
        inner.stores.insert(id, store.clone());
        Ok((user, store))
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.read().users.get(&id.as_i64()).cloned())
    }

    async fn get_user_by_login_id(&self, login_id: &str) -> Result<Option<User>> {
        Ok(self
            .read()
            .users
            .values()
            .find(|u| u.login_id == login_id)
            .cloned())
    }

    async fn login_id_exists(&self, login_id: &str) -> Result<bool> {
        Ok(self.read().users.values().any(|u| u.login_id == login_id))
    }

    async fn update_user_profile(&self, id: UserId, update: UserProfileUpdate) -> Result<()> {
        let mut inner = self.write();
        let user = inner
            .users
            .get_mut(&id.as_i64())
            .ok_or_else(|| StoreError::not_found("user", id))?;
        user.nickname = update.nickname;
        user.address = update.address;
        user.likes = update.likes;
        if let Some(url) = update.image_url {
            user.image_url = Some(url);
        }
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn update_user_password(&self, id: UserId, password_hash: &str) -> Result<()> {
        let mut inner = self.write();
        let user = inner
            .users
            .get_mut(&id.as_i64())
            .ok_or_else(|| StoreError::not_found("user", id))?;
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn adjust_user_point(&self, id: UserId, delta: i64) -> Result<i64> {
        let mut inner = self.write();
        let user = inner
            .users
            .get_mut(&id.as_i64())
            .ok_or_else(|| StoreError::not_found("user", id))?;
        user.point += delta;
        user.updated_at = Utc::now();
        Ok(user.point)
    }

    async fn set_user_status(&self, id: UserId, status: AccountStatus) -> Result<()> {
        let mut inner = self.write();
        let user = inner
            .users
            .get_mut(&id.as_i64())
            .ok_or_else(|| StoreError::not_found("user", id))?;
        user.status = status;
        user.updated_at = Utc::now();
        Ok(())
    }

    // =========================================================================
    // Store Operations
    // =========================================================================

    async fn get_store(&self, id: StoreId) -> Result<Option<Store>> {
        Ok(self.read().stores.get(&id.as_i64()).cloned())
    }

    async fn get_store_by_owner(&self, owner_id: UserId) -> Result<Option<Store>> {
        Ok(self
            .read()
            .stores
            .values()
            .find(|s| s.owner_id == owner_id)
            .cloned())
    }

    async fn list_stores(&self) -> Result<Vec<Store>> {
        let mut stores: Vec<Store> = self
            .read()
            .stores
            .values()
            .filter(|s| s.status == AccountStatus::Active)
            .cloned()
            .collect();
        stores.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(stores)
    }

    async fn list_new_stores(&self, limit: i64) -> Result<Vec<Store>> {
        let mut stores: Vec<Store> = self
            .read()
            .stores
            .values()
            .filter(|s| s.status == AccountStatus::Active)
            .cloned()
            .collect();
        stores.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        stores.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(stores)
    }

    async fn list_popular_stores(
        &self,
        category: StoreCategory,
        limit: i64,
    ) -> Result<Vec<Store>> {
        let mut stores: Vec<Store> = self
            .read()
            .stores
            .values()
            .filter(|s| s.status == AccountStatus::Active && s.category == category)
            .cloned()
            .collect();
        stores.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        stores.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(stores)
    }

    async fn search_stores(&self, keyword: &str, sort: StoreSort) -> Result<Vec<Store>> {
        let keyword = keyword.to_lowercase();
        let inner = self.read();
        let mut stores: Vec<Store> = inner
            .stores
            .values()
            .filter(|s| {
                s.status == AccountStatus::Active && s.name.to_lowercase().contains(&keyword)
            })
            .cloned()
            .collect();
        match sort {
            StoreSort::Name => stores.sort_by(|a, b| a.name.cmp(&b.name)),
            StoreSort::Score => stores.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
            StoreSort::Jjim => stores.sort_by_key(|s| std::cmp::Reverse(inner.count_store_jjims(s.id))),
        }
        Ok(stores)
    }

    async fn update_store_profile(&self, id: StoreId, update: StoreProfileUpdate) -> Result<()> {
        let mut inner = self.write();
        let store = inner
            .stores
            .get_mut(&id.as_i64())
            .ok_or_else(|| StoreError::not_found("store", id))?;
        store.name = update.name;
        store.address = update.address;
        store.category = update.category;
        if let Some(url) = update.image_url {
            store.image_url = Some(url);
        }
        store.updated_at = Utc::now();
        Ok(())
    }

    async fn set_store_status_by_owner(
        &self,
        owner_id: UserId,
        status: AccountStatus,
    ) -> Result<()> {
        let mut inner = self.write();
        let store = inner
            .stores
            .values_mut()
            .find(|s| s.owner_id == owner_id)
            .ok_or_else(|| StoreError::not_found("store owned by user", owner_id))?;
        store.status = status;
        store.updated_at = Utc::now();
        Ok(())
    }

    async fn count_store_jjims(&self, store_id: StoreId) -> Result<i64> {
        Ok(self.read().count_store_jjims(store_id))
    }

    // =========================================================================
    // Listing Operations
    // =========================================================================

    async fn create_listing(&self, new: NewListing) -> Result<Listing> {
        let mut inner = self.write();
        if !inner.stores.contains_key(&new.store_id.as_i64()) {
            return Err(StoreError::not_found("store", new.store_id));
        }
        let now = Utc::now();
        let id = Inner::next(&mut inner.next_listing);
        let listing = Listing {
            id: ListingId::new(id),
            store_id: new.store_id,
            product_name: new.product_name,
            product_guide: new.product_guide,
            product_comment: new.product_comment,
            image_url: new.image_url,
            available_count: new.available_count,
            status: ListingStatus::Active,
            created_at: now,
            updated_at: now,
        };
        inner.listings.insert(id, listing.clone());
        Ok(listing)
    }

    async fn get_listing(&self, id: ListingId) -> Result<Option<Listing>> {
        Ok(self.read().listings.get(&id.as_i64()).cloned())
    }

    async fn list_store_listings(
        &self,
        store_id: StoreId,
        status: ListingStatus,
    ) -> Result<Vec<Listing>> {
        let mut listings: Vec<Listing> = self
            .read()
            .listings
            .values()
            .filter(|l| l.store_id == store_id && l.status == status)
            .cloned()
            .collect();
        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listings)
    }

    async fn update_listing(&self, id: ListingId, update: ListingUpdate) -> Result<()> {
        let mut inner = self.write();
        let listing = inner
            .listings
            .get_mut(&id.as_i64())
            .ok_or_else(|| StoreError::not_found("listing", id))?;
        listing.product_name = update.product_name;
        listing.product_guide = update.product_guide;
        listing.product_comment = update.product_comment;
        listing.available_count = update.available_count;
        if let Some(url) = update.image_url {
            listing.image_url = Some(url);
        }
        listing.updated_at = Utc::now();
        Ok(())
    }

    async fn set_listing_status(&self, id: ListingId, status: ListingStatus) -> Result<()> {
        let mut inner = self.write();
        let listing = inner
            .listings
            .get_mut(&id.as_i64())
            .ok_or_else(|| StoreError::not_found("listing", id))?;
        listing.status = status;
        listing.updated_at = Utc::now();
        Ok(())
    }

    // =========================================================================
    // Task Operations
    // =========================================================================

    async fn create_task(&self, listing_id: ListingId, user_id: UserId) -> Result<RebornTask> {
        let mut inner = self.write();
        let listing = inner
            .listings
            .get_mut(&listing_id.as_i64())
            .ok_or_else(|| StoreError::not_found("listing", listing_id))?;
        if !listing.is_claimable() {
            return Err(StoreError::Conflict(format!(
                "listing {listing_id} is not claimable"
            )));
        }
        listing.available_count -= 1;
        if listing.available_count == 0 {
            listing.status = ListingStatus::SoldOut;
        }
        listing.updated_at = Utc::now();

        let now = Utc::now();
        let id = Inner::next(&mut inner.next_task);
        let task = RebornTask {
            id: TaskId::new(id),
            listing_id,
            user_id,
            status: TaskStatus::Active,
            created_at: now,
            updated_at: now,
        };
        inner.tasks.insert(id, task.clone());
        Ok(task)
    }

    async fn get_task(&self, id: TaskId) -> Result<Option<RebornTask>> {
        Ok(self.read().tasks.get(&id.as_i64()).cloned())
    }

    async fn set_task_status(&self, id: TaskId, status: TaskStatus) -> Result<()> {
        let mut inner = self.write();
        let task = inner
            .tasks
            .get_mut(&id.as_i64())
            .ok_or_else(|| StoreError::not_found("task", id))?;
        task.status = status;
        task.updated_at = Utc::now();
        Ok(())
    }

    async fn list_in_progress(&self, user_id: UserId) -> Result<Vec<TaskRow>> {
        let inner = self.read();
        let mut rows: Vec<TaskRow> = inner
            .tasks
            .values()
            .filter(|t| t.user_id == user_id && t.status == TaskStatus::Active)
            .filter_map(|t| {
                let listing = inner.listings.get(&t.listing_id.as_i64())?;
                let store = inner.stores.get(&listing.store_id.as_i64())?;
                Some(TaskRow {
                    task_id: t.id,
                    listing_id: t.listing_id,
                    product_name: listing.product_name.clone(),
                    product_image_url: listing.image_url.clone(),
                    store_id: store.id,
                    store_name: store.name.clone(),
                    store_address: store.address.clone(),
                    status: t.status,
                    created_at: t.created_at,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn list_history(&self, user_id: UserId) -> Result<Vec<HistoryRow>> {
        let inner = self.read();
        let mut rows: Vec<HistoryRow> = inner
            .tasks
            .values()
            .filter(|t| t.user_id == user_id && t.status == TaskStatus::Complete)
            .filter_map(|t| {
                let listing = inner.listings.get(&t.listing_id.as_i64())?;
                let store = inner.stores.get(&listing.store_id.as_i64())?;
                Some(HistoryRow {
                    task_id: t.id,
                    store_name: store.name.clone(),
                    store_score: store.score,
                    store_address: store.address.clone(),
                    completed_at: t.updated_at,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(rows)
    }

    async fn get_history_detail(&self, task_id: TaskId) -> Result<Option<HistoryDetailRow>> {
        let inner = self.read();
        let Some(task) = inner.tasks.get(&task_id.as_i64()) else {
            return Ok(None);
        };
        let Some(listing) = inner.listings.get(&task.listing_id.as_i64()) else {
            return Ok(None);
        };
        let Some(store) = inner.stores.get(&listing.store_id.as_i64()) else {
            return Ok(None);
        };
        Ok(Some(HistoryDetailRow {
            task_id: task.id,
            product_name: listing.product_name.clone(),
            product_guide: listing.product_guide.clone(),
            product_comment: listing.product_comment.clone(),
            product_image_url: listing.image_url.clone(),
            store_name: store.name.clone(),
            store_address: store.address.clone(),
            status: task.status,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }))
    }

    async fn find_completed_task(
        &self,
        listing_id: ListingId,
        user_id: UserId,
    ) -> Result<Option<RebornTask>> {
        Ok(self
            .read()
            .tasks
            .values()
            .find(|t| {
                t.listing_id == listing_id
                    && t.user_id == user_id
                    && t.status == TaskStatus::Complete
            })
            .cloned())
    }

    // =========================================================================
    // Review Operations
    // =========================================================================

    async fn create_review(&self, new: NewReview) -> Result<Review> {
        let mut inner = self.write();
        if !inner.listings.contains_key(&new.listing_id.as_i64()) {
            return Err(StoreError::not_found("listing", new.listing_id));
        }
        let id = Inner::next(&mut inner.next_review);
        let review = Review {
            id: ReviewId::new(id),
            user_id: new.user_id,
            listing_id: new.listing_id,
            score: new.score,
            comment: new.comment,
            image_urls: new.image_urls,
            created_at: Utc::now(),
        };
        inner.reviews.insert(id, review.clone());
        Ok(review)
    }

    async fn get_review_record(&self, id: ReviewId) -> Result<Option<Review>> {
        Ok(self.read().reviews.get(&id.as_i64()).cloned())
    }

    async fn get_review(&self, id: ReviewId) -> Result<Option<ReviewRow>> {
        let inner = self.read();
        Ok(inner
            .reviews
            .get(&id.as_i64())
            .and_then(|r| inner.review_row(r)))
    }

    async fn delete_review(&self, id: ReviewId) -> Result<()> {
        let mut inner = self.write();
        inner
            .reviews
            .remove(&id.as_i64())
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("review", id))
    }

    async fn list_store_reviews(&self, store_id: StoreId) -> Result<Vec<ReviewRow>> {
        let inner = self.read();
        let mut rows: Vec<ReviewRow> = inner
            .reviews
            .values()
            .filter(|r| {
                inner
                    .listings
                    .get(&r.listing_id.as_i64())
                    .is_some_and(|l| l.store_id == store_id)
            })
            .filter_map(|r| inner.review_row(r))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn list_user_reviews(&self, user_id: UserId) -> Result<Vec<ReviewRow>> {
        let inner = self.read();
        let mut rows: Vec<ReviewRow> = inner
            .reviews
            .values()
            .filter(|r| r.user_id == user_id)
            .filter_map(|r| inner.review_row(r))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn best_reviews(&self, limit: i64) -> Result<Vec<ReviewRow>> {
        let inner = self.read();
        let mut rows: Vec<ReviewRow> = inner
            .reviews
            .values()
            .filter_map(|r| inner.review_row(r))
            .collect();
        rows.sort_by(|a, b| b.score.cmp(&a.score).then(b.created_at.cmp(&a.created_at)));
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }

    async fn count_store_reviews(&self, store_id: StoreId) -> Result<i64> {
        Ok(self.read().store_review_scores(store_id).len() as i64)
    }

    // =========================================================================
    // Score Aggregation
    // =========================================================================

    async fn recompute_store_score(&self, store_id: StoreId) -> Result<()> {
        self.write().recompute_store_score(store_id)
    }

    async fn recompute_store_score_by_listing(&self, listing_id: ListingId) -> Result<()> {
        let mut inner = self.write();
        let store_id = inner
            .listings
            .get(&listing_id.as_i64())
            .map(|l| l.store_id)
            .ok_or_else(|| StoreError::not_found("listing", listing_id))?;
        inner.recompute_store_score(store_id)
    }

    async fn recompute_all_store_scores(&self) -> Result<usize> {
        let mut inner = self.write();
        // Distinct stores referenced by at least one review, in id order.
        let store_ids: Vec<StoreId> = inner
            .reviews
            .values()
            .filter_map(|r| inner.listings.get(&r.listing_id.as_i64()))
            .map(|l| l.store_id)
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut updated = 0;
        for store_id in store_ids {
            inner.recompute_store_score(store_id)?;
            updated += 1;
        }
        Ok(updated)
    }

    // =========================================================================
    // Jjim Operations
    // =========================================================================

    async fn create_jjim(&self, user_id: UserId, listing_id: ListingId) -> Result<Jjim> {
        let mut inner = self.write();
        if !inner.listings.contains_key(&listing_id.as_i64()) {
            return Err(StoreError::not_found("listing", listing_id));
        }
        if inner
            .jjims
            .values()
            .any(|j| j.user_id == user_id && j.listing_id == listing_id)
        {
            return Err(StoreError::Conflict(format!(
                "listing {listing_id} already favorited"
            )));
        }
        let id = Inner::next(&mut inner.next_jjim);
        let jjim = Jjim {
            id: reborn_core::JjimId::new(id),
            user_id,
            listing_id,
            created_at: Utc::now(),
        };
        inner.jjims.insert(id, jjim.clone());
        Ok(jjim)
    }

    async fn delete_jjim(&self, user_id: UserId, listing_id: ListingId) -> Result<()> {
        let mut inner = self.write();
        let id = inner
            .jjims
            .values()
            .find(|j| j.user_id == user_id && j.listing_id == listing_id)
            .map(|j| j.id.as_i64())
            .ok_or_else(|| StoreError::not_found("jjim for listing", listing_id))?;
        inner.jjims.remove(&id);
        Ok(())
    }

    async fn list_user_jjims(&self, user_id: UserId) -> Result<Vec<JjimRow>> {
        let inner = self.read();
        let mut rows: Vec<JjimRow> = inner
            .jjims
            .values()
            .filter(|j| j.user_id == user_id)
            .filter_map(|j| {
                let listing = inner.listings.get(&j.listing_id.as_i64())?;
                let store = inner.stores.get(&listing.store_id.as_i64())?;
                Some(JjimRow {
                    jjim_id: j.id,
                    listing_id: j.listing_id,
                    product_name: listing.product_name.clone(),
                    product_image_url: listing.image_url.clone(),
                    listing_status: listing.status,
                    store_id: store.id,
                    store_name: store.name.clone(),
                    created_at: j.created_at,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}
