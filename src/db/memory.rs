use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::badge::{default_catalog, Badge, UserBadge};
use crate::models::log_entry::{LogEntry, YearRange};
use crate::models::recap::{PhotoHighlight, TopPost, YearRecapStats};

#[derive(Debug, Default)]
struct Tables {
    logs: Vec<LogEntry>,
    // (log_id, liker)
    likes: Vec<(Uuid, Uuid)>,
    // (log_id, author)
    comments: Vec<(Uuid, Uuid)>,
    // (follower, following)
    follows: HashSet<(Uuid, Uuid)>,
    badges: Vec<Badge>,
    user_badges: Vec<UserBadge>,
}

/// In-process [`Store`] with the same ordering and uniqueness rules as the Postgres schema.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    offline: AtomicBool,
    reject_inserts: AtomicBool,
    stale_earned_reads: AtomicBool,
}

impl MemoryStore {
    /// Empty store seeded with the default badge catalog.
    pub fn new() -> Self {
        Self::with_catalog(default_catalog())
    }

    pub fn with_catalog(badges: Vec<Badge>) -> Self {
        Self {
            tables: RwLock::new(Tables {
                badges,
                ..Tables::default()
            }),
            ..Self::default()
        }
    }

    pub async fn insert_log(&self, entry: LogEntry) -> Uuid {
        let id = entry.id;
        self.tables.write().await.logs.push(entry);
        id
    }

    pub async fn add_like(&self, log_id: Uuid, liker: Uuid) {
        let mut tables = self.tables.write().await;
        if !tables.likes.contains(&(log_id, liker)) {
            tables.likes.push((log_id, liker));
        }
    }

    pub async fn add_comment(&self, log_id: Uuid, author: Uuid) {
        self.tables.write().await.comments.push((log_id, author));
    }

    pub async fn add_follow(&self, follower: Uuid, following: Uuid) {
        self.tables.write().await.follows.insert((follower, following));
    }

    /// Simulates the store being unreachable: every call fails until cleared.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Makes badge batch inserts fail while leaving reads working.
    pub fn set_reject_inserts(&self, reject: bool) {
        self.reject_inserts.store(reject, Ordering::SeqCst);
    }

    /// Makes earned-badge lookups report nothing held, as a read taken just before a
    /// concurrent award would.
    pub fn set_stale_earned_reads(&self, stale: bool) {
        self.stale_earned_reads.store(stale, Ordering::SeqCst);
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        Ok(())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn likes_for(tables: &Tables, log_id: Uuid) -> i64 {
    tables.likes.iter().filter(|(id, _)| *id == log_id).count() as i64
}

fn logs_in<'a>(
    tables: &'a Tables,
    user_id: Uuid,
    range: YearRange,
) -> impl Iterator<Item = &'a LogEntry> + 'a {
    tables
        .logs
        .iter()
        .filter(move |l| l.owner == user_id && range.contains(l.event_date))
}

fn aggregate_year(tables: &Tables, user_id: Uuid, range: YearRange) -> Option<YearRecapStats> {
    let logs: Vec<&LogEntry> = logs_in(tables, user_id, range).collect();
    if logs.is_empty() {
        return None;
    }

    let mut month_breakdown: BTreeMap<u32, i64> = (1..=12).map(|m| (m, 0)).collect();
    let mut location_counts: BTreeMap<&str, i64> = BTreeMap::new();
    let mut trips: BTreeSet<&str> = BTreeSet::new();
    let mut total_photos = 0;
    let mut total_likes = 0;
    let mut total_comments = 0;

    for log in &logs {
        *month_breakdown.entry(log.event_date.month()).or_insert(0) += 1;
        if let Some(location) = non_empty(&log.location) {
            *location_counts.entry(location).or_insert(0) += 1;
        }
        if let Some(trip) = non_empty(&log.trip_name) {
            trips.insert(trip);
        }
        if log.image_url.is_some() {
            total_photos += 1;
        }
        total_likes += likes_for(tables, log.id);
        total_comments += tables.comments.iter().filter(|(id, _)| *id == log.id).count() as i64;
    }

    // Highest count wins; ties go to the earliest month / alphabetically first place.
    let busiest_month = month_breakdown
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .map(|(month, _)| *month);
    let top_location = location_counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .map(|(location, count)| (location.to_string(), *count));

    Some(YearRecapStats {
        total_logs: logs.len() as i64,
        unique_locations: location_counts.len() as i64,
        total_photos,
        unique_trips: trips.len() as i64,
        first_log_date: logs.iter().map(|l| l.event_date).min(),
        last_log_date: logs.iter().map(|l| l.event_date).max(),
        busiest_month,
        total_likes,
        total_comments,
        top_location_count: top_location.as_ref().map(|(_, c)| *c).unwrap_or(0),
        top_location: top_location.map(|(l, _)| l),
        month_breakdown,
    })
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.check_online()
    }

    async fn event_dates(&self, user_id: Uuid) -> StoreResult<Vec<NaiveDate>> {
        self.check_online()?;
        let tables = self.tables.read().await;
        let mut dates: Vec<NaiveDate> = tables
            .logs
            .iter()
            .filter(|l| l.owner == user_id)
            .map(|l| l.event_date)
            .collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        Ok(dates)
    }

    async fn count_posts(&self, user_id: Uuid) -> StoreResult<i64> {
        self.check_online()?;
        let tables = self.tables.read().await;
        Ok(tables.logs.iter().filter(|l| l.owner == user_id).count() as i64)
    }

    async fn count_unique_locations(&self, user_id: Uuid) -> StoreResult<i64> {
        self.check_online()?;
        let tables = self.tables.read().await;
        let locations: HashSet<&str> = tables
            .logs
            .iter()
            .filter(|l| l.owner == user_id)
            .filter_map(|l| non_empty(&l.location))
            .collect();
        Ok(locations.len() as i64)
    }

    async fn count_followers(&self, user_id: Uuid) -> StoreResult<i64> {
        self.check_online()?;
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .iter()
            .filter(|(_, following)| *following == user_id)
            .count() as i64)
    }

    async fn total_likes_received(&self, user_id: Uuid) -> StoreResult<i64> {
        self.check_online()?;
        let tables = self.tables.read().await;
        Ok(tables
            .logs
            .iter()
            .filter(|l| l.owner == user_id)
            .map(|l| likes_for(&tables, l.id))
            .sum())
    }

    async fn badge_catalog(&self) -> StoreResult<Vec<Badge>> {
        self.check_online()?;
        let mut badges = self.tables.read().await.badges.clone();
        badges.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then(a.requirement_value.cmp(&b.requirement_value))
                .then(a.name.cmp(&b.name))
        });
        Ok(badges)
    }

    async fn earned_badge_ids(&self, user_id: Uuid) -> StoreResult<HashSet<Uuid>> {
        self.check_online()?;
        if self.stale_earned_reads.load(Ordering::SeqCst) {
            return Ok(HashSet::new());
        }
        let tables = self.tables.read().await;
        Ok(tables
            .user_badges
            .iter()
            .filter(|ub| ub.user_id == user_id)
            .map(|ub| ub.badge_id)
            .collect())
    }

    async fn user_badges(&self, user_id: Uuid) -> StoreResult<Vec<UserBadge>> {
        self.check_online()?;
        let tables = self.tables.read().await;
        let mut rows: Vec<UserBadge> = tables
            .user_badges
            .iter()
            .filter(|ub| ub.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.earned_at.cmp(&b.earned_at).then(a.badge_id.cmp(&b.badge_id)));
        Ok(rows)
    }

    async fn insert_user_badges(&self, rows: &[UserBadge]) -> StoreResult<HashSet<Uuid>> {
        self.check_online()?;
        if self.reject_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("user_badges insert rejected".into()));
        }

        let mut tables = self.tables.write().await;
        let mut held: HashSet<(Uuid, Uuid)> = tables
            .user_badges
            .iter()
            .map(|ub| (ub.user_id, ub.badge_id))
            .collect();

        let mut inserted = HashSet::new();
        for row in rows {
            if held.insert((row.user_id, row.badge_id)) {
                tables.user_badges.push(row.clone());
                inserted.insert(row.badge_id);
            }
        }
        Ok(inserted)
    }

    async fn year_recap_stats(
        &self,
        user_id: Uuid,
        year: i32,
    ) -> StoreResult<Option<YearRecapStats>> {
        self.check_online()?;
        let Some(range) = YearRange::new(year) else {
            return Ok(None);
        };
        let tables = self.tables.read().await;
        Ok(aggregate_year(&tables, user_id, range))
    }

    async fn top_posts(
        &self,
        user_id: Uuid,
        range: YearRange,
        limit: i64,
    ) -> StoreResult<Vec<TopPost>> {
        self.check_online()?;
        let tables = self.tables.read().await;
        let mut posts: Vec<TopPost> = logs_in(&tables, user_id, range)
            .map(|l| TopPost {
                id: l.id,
                title: l.title.clone(),
                event_date: l.event_date,
                location: l.location.clone(),
                image_url: l.image_url.clone(),
                like_count: likes_for(&tables, l.id),
            })
            .collect();
        posts.sort_by(|a, b| {
            b.like_count
                .cmp(&a.like_count)
                .then(b.event_date.cmp(&a.event_date))
                .then(a.id.cmp(&b.id))
        });
        posts.truncate(limit.max(0) as usize);
        Ok(posts)
    }

    async fn distinct_locations(
        &self,
        user_id: Uuid,
        range: YearRange,
    ) -> StoreResult<Vec<String>> {
        self.check_online()?;
        let tables = self.tables.read().await;
        let locations: BTreeSet<&str> = logs_in(&tables, user_id, range)
            .filter_map(|l| non_empty(&l.location))
            .collect();
        Ok(locations.into_iter().map(String::from).collect())
    }

    async fn distinct_trips(&self, user_id: Uuid, range: YearRange) -> StoreResult<Vec<String>> {
        self.check_online()?;
        let tables = self.tables.read().await;
        let trips: BTreeSet<&str> = logs_in(&tables, user_id, range)
            .filter_map(|l| non_empty(&l.trip_name))
            .collect();
        Ok(trips.into_iter().map(String::from).collect())
    }

    async fn photo_highlights(
        &self,
        user_id: Uuid,
        range: YearRange,
        limit: i64,
    ) -> StoreResult<Vec<PhotoHighlight>> {
        self.check_online()?;
        let tables = self.tables.read().await;
        let mut photos: Vec<PhotoHighlight> = logs_in(&tables, user_id, range)
            .filter_map(|l| {
                l.image_url.as_ref().map(|url| PhotoHighlight {
                    id: l.id,
                    title: l.title.clone(),
                    event_date: l.event_date,
                    image_url: url.clone(),
                    location: l.location.clone(),
                    created_at: l.created_at,
                })
            })
            .collect();
        photos.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        photos.truncate(limit.max(0) as usize);
        Ok(photos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn aggregate_counts_locations_and_picks_top() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store
            .insert_log(LogEntry::new(user, date(2024, 3, 1), "Louvre").with_location("Paris"))
            .await;
        store
            .insert_log(LogEntry::new(user, date(2024, 3, 2), "Seine").with_location("Paris"))
            .await;
        store
            .insert_log(LogEntry::new(user, date(2024, 7, 9), "Shibuya").with_location("Tokyo"))
            .await;
        store
            .insert_log(LogEntry::new(user, date(2024, 8, 1), "Home day"))
            .await;

        let stats = store.year_recap_stats(user, 2024).await.unwrap().unwrap();
        assert_eq!(stats.total_logs, 4);
        assert_eq!(stats.unique_locations, 2);
        assert_eq!(stats.top_location.as_deref(), Some("Paris"));
        assert_eq!(stats.top_location_count, 2);
        assert_eq!(stats.busiest_month, Some(3));
        assert_eq!(stats.month_breakdown.len(), 12);
        assert_eq!(stats.month_breakdown[&12], 0);
        assert_eq!(stats.first_log_date, Some(date(2024, 3, 1)));
        assert_eq!(stats.last_log_date, Some(date(2024, 8, 1)));
    }

    #[tokio::test]
    async fn aggregate_is_absent_for_empty_year() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store
            .insert_log(LogEntry::new(user, date(2023, 12, 31), "NYE"))
            .await;

        assert!(store.year_recap_stats(user, 2024).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_award_is_skipped() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let badge = default_catalog()[0].id;
        let row = UserBadge {
            user_id: user,
            badge_id: badge,
            earned_at: chrono::Utc::now(),
        };

        let first = store.insert_user_badges(&[row.clone()]).await.unwrap();
        assert_eq!(first, HashSet::from([badge]));
        assert!(store
            .insert_user_badges(&[row.clone(), row])
            .await
            .unwrap()
            .is_empty());
        assert_eq!(store.user_badges(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn offline_store_fails_every_call() {
        let store = MemoryStore::new();
        store.set_offline(true);
        assert!(matches!(
            store.count_posts(Uuid::new_v4()).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.ping().await.is_err());
    }
}
