//! Data access for the streak and recap engines.
//!
//! Everything the services read or write goes through [`Store`], so the engines can run
//! against Postgres in production and against [`MemoryStore`] in tests or local runs.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::badge::{Badge, UserBadge};
use crate::models::log_entry::YearRange;
use crate::models::recap::{PhotoHighlight, TopPost, YearRecapStats};

pub mod memory;
pub mod pool;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Malformed aggregate result: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;

    /// Every event date the user has logged, most recent first. May contain duplicates.
    async fn event_dates(&self, user_id: Uuid) -> StoreResult<Vec<NaiveDate>>;

    async fn count_posts(&self, user_id: Uuid) -> StoreResult<i64>;

    /// Distinct non-empty locations across all of the user's logs.
    async fn count_unique_locations(&self, user_id: Uuid) -> StoreResult<i64>;

    async fn count_followers(&self, user_id: Uuid) -> StoreResult<i64>;

    /// Likes received across all of the user's logs.
    async fn total_likes_received(&self, user_id: Uuid) -> StoreResult<i64>;

    async fn badge_catalog(&self) -> StoreResult<Vec<Badge>>;

    async fn earned_badge_ids(&self, user_id: Uuid) -> StoreResult<HashSet<Uuid>>;

    /// Earned badge records, oldest first.
    async fn user_badges(&self, user_id: Uuid) -> StoreResult<Vec<UserBadge>>;

    /// Inserts the batch atomically. Pairs the user already holds are skipped, not
    /// rejected. Returns the badge ids this call actually created.
    async fn insert_user_badges(&self, rows: &[UserBadge]) -> StoreResult<HashSet<Uuid>>;

    /// Server-side yearly aggregate. `None` when the user has no logs in `year`.
    async fn year_recap_stats(&self, user_id: Uuid, year: i32)
        -> StoreResult<Option<YearRecapStats>>;

    /// Logs in `range` by like count desc, event date desc, id asc.
    async fn top_posts(&self, user_id: Uuid, range: YearRange, limit: i64)
        -> StoreResult<Vec<TopPost>>;

    /// Distinct non-empty locations in `range`, sorted.
    async fn distinct_locations(&self, user_id: Uuid, range: YearRange)
        -> StoreResult<Vec<String>>;

    /// Distinct non-empty trip names in `range`, sorted.
    async fn distinct_trips(&self, user_id: Uuid, range: YearRange) -> StoreResult<Vec<String>>;

    /// Logs with an image in `range`, newest record first (ties by id).
    async fn photo_highlights(
        &self,
        user_id: Uuid,
        range: YearRange,
        limit: i64,
    ) -> StoreResult<Vec<PhotoHighlight>>;
}
