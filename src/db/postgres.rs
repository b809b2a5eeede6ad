use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, StoreResult};
use crate::models::badge::{Badge, UserBadge};
use crate::models::log_entry::YearRange;
use crate::models::recap::{PhotoHighlight, TopPost, YearRecapStats};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    async fn event_dates(&self, user_id: Uuid) -> StoreResult<Vec<NaiveDate>> {
        let dates = sqlx::query_scalar::<_, NaiveDate>(
            "SELECT event_date FROM logs WHERE user_id = $1 ORDER BY event_date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(dates)
    }

    async fn count_posts(&self, user_id: Uuid) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM logs WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn count_unique_locations(&self, user_id: Uuid) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(DISTINCT location) FROM logs
            WHERE user_id = $1 AND location IS NOT NULL AND location <> ''
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_followers(&self, user_id: Uuid) -> StoreResult<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE following_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn total_likes_received(&self, user_id: Uuid) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM likes k
            JOIN logs l ON l.id = k.log_id
            WHERE l.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn badge_catalog(&self) -> StoreResult<Vec<Badge>> {
        let badges = sqlx::query_as::<_, Badge>(
            r#"
            SELECT id, name, description, icon, category, requirement_type, requirement_value
            FROM badges
            ORDER BY category ASC, requirement_value ASC, name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(badges)
    }

    async fn earned_badge_ids(&self, user_id: Uuid) -> StoreResult<HashSet<Uuid>> {
        let ids =
            sqlx::query_scalar::<_, Uuid>("SELECT badge_id FROM user_badges WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(ids.into_iter().collect())
    }

    async fn user_badges(&self, user_id: Uuid) -> StoreResult<Vec<UserBadge>> {
        let rows = sqlx::query_as::<_, UserBadge>(
            r#"
            SELECT user_id, badge_id, earned_at FROM user_badges
            WHERE user_id = $1
            ORDER BY earned_at ASC, badge_id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn insert_user_badges(&self, rows: &[UserBadge]) -> StoreResult<HashSet<Uuid>> {
        if rows.is_empty() {
            return Ok(HashSet::new());
        }

        let user_ids: Vec<Uuid> = rows.iter().map(|r| r.user_id).collect();
        let badge_ids: Vec<Uuid> = rows.iter().map(|r| r.badge_id).collect();
        let earned_at: Vec<DateTime<Utc>> = rows.iter().map(|r| r.earned_at).collect();

        // Single statement, so the batch lands all-or-nothing.
        // UNIQUE (user_id, badge_id) turns concurrent duplicate awards into no-ops.
        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO user_badges (user_id, badge_id, earned_at)
            SELECT * FROM UNNEST($1::uuid[], $2::uuid[], $3::timestamptz[])
            ON CONFLICT (user_id, badge_id) DO NOTHING
            RETURNING badge_id
            "#,
        )
        .bind(&user_ids)
        .bind(&badge_ids)
        .bind(&earned_at)
        .fetch_all(&self.pool)
        .await?;

        Ok(inserted.into_iter().collect())
    }

    async fn year_recap_stats(
        &self,
        user_id: Uuid,
        year: i32,
    ) -> StoreResult<Option<YearRecapStats>> {
        let raw = sqlx::query_scalar::<_, Option<serde_json::Value>>(
            "SELECT get_year_recap_stats($1, $2)",
        )
        .bind(user_id)
        .bind(year)
        .fetch_one(&self.pool)
        .await?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        let stats: YearRecapStats = serde_json::from_value(raw)?;
        if stats.total_logs == 0 {
            return Ok(None);
        }
        Ok(Some(stats))
    }

    async fn top_posts(
        &self,
        user_id: Uuid,
        range: YearRange,
        limit: i64,
    ) -> StoreResult<Vec<TopPost>> {
        let posts = sqlx::query_as::<_, TopPost>(
            r#"
            SELECT l.id, l.title, l.event_date, l.location, l.image_url,
                   COUNT(k.log_id) AS like_count
            FROM logs l
            LEFT JOIN likes k ON k.log_id = l.id
            WHERE l.user_id = $1 AND l.event_date BETWEEN $2 AND $3
            GROUP BY l.id
            ORDER BY like_count DESC, l.event_date DESC, l.id ASC
            LIMIT $4
            "#,
        )
        .bind(user_id)
        .bind(range.start)
        .bind(range.end)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn distinct_locations(
        &self,
        user_id: Uuid,
        range: YearRange,
    ) -> StoreResult<Vec<String>> {
        let locations = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT location FROM logs
            WHERE user_id = $1 AND event_date BETWEEN $2 AND $3
              AND location IS NOT NULL AND location <> ''
            ORDER BY location ASC
            "#,
        )
        .bind(user_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(locations)
    }

    async fn distinct_trips(&self, user_id: Uuid, range: YearRange) -> StoreResult<Vec<String>> {
        let trips = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT trip_name FROM logs
            WHERE user_id = $1 AND event_date BETWEEN $2 AND $3
              AND trip_name IS NOT NULL AND trip_name <> ''
            ORDER BY trip_name ASC
            "#,
        )
        .bind(user_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(trips)
    }

    async fn photo_highlights(
        &self,
        user_id: Uuid,
        range: YearRange,
        limit: i64,
    ) -> StoreResult<Vec<PhotoHighlight>> {
        let photos = sqlx::query_as::<_, PhotoHighlight>(
            r#"
            SELECT id, title, event_date, image_url, location, created_at
            FROM logs
            WHERE user_id = $1 AND event_date BETWEEN $2 AND $3
              AND image_url IS NOT NULL
            ORDER BY created_at DESC, id ASC
            LIMIT $4
            "#,
        )
        .bind(user_id)
        .bind(range.start)
        .bind(range.end)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(photos)
    }
}
