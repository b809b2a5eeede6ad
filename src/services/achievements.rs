//! Badge awarding.
//!
//! The catalog is data: each badge names a [`RequirementType`] and a threshold, and
//! evaluation is a single `stat >= threshold` check per requirement type. Awards are
//! written in one batch and are never repeated for the same (user, badge) pair.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use super::streak::compute_streaks;
use crate::db::{Store, StoreResult};
use crate::models::badge::{
    Badge, BadgeStats, BadgeTrigger, EarnedBadge, RequirementType, UserBadge,
};

impl BadgeStats {
    /// The statistic a requirement is measured against. Daily streak badges accept either
    /// the current or the longest streak, so the better of the two is used.
    pub fn value_for(&self, requirement: RequirementType) -> i64 {
        match requirement {
            RequirementType::Posts => self.posts,
            RequirementType::Locations => self.locations,
            RequirementType::Followers => self.followers,
            RequirementType::TotalLikes => self.total_likes,
            RequirementType::DailyStreak => {
                i64::from(self.current_streak.max(self.longest_streak))
            }
        }
    }
}

pub fn qualifies(badge: &Badge, stats: &BadgeStats) -> bool {
    stats.value_for(badge.requirement_type) >= i64::from(badge.requirement_value)
}

/// Catalog badges the user qualifies for and does not hold yet, in catalog order.
pub fn newly_qualified(
    catalog: &[Badge],
    earned: &HashSet<Uuid>,
    stats: &BadgeStats,
) -> Vec<Badge> {
    catalog
        .iter()
        .filter(|badge| !earned.contains(&badge.id))
        .filter(|badge| qualifies(badge, stats))
        .cloned()
        .collect()
}

pub async fn collect_badge_stats(
    store: &dyn Store,
    today: NaiveDate,
    user_id: Uuid,
) -> StoreResult<BadgeStats> {
    let (posts, locations, followers, total_likes, dates) = tokio::try_join!(
        store.count_posts(user_id),
        store.count_unique_locations(user_id),
        store.count_followers(user_id),
        store.total_likes_received(user_id),
        store.event_dates(user_id),
    )?;

    let streaks = compute_streaks(&dates, today);

    Ok(BadgeStats {
        posts,
        locations,
        followers,
        total_likes,
        current_streak: streaks.current,
        longest_streak: streaks.longest,
    })
}

/// Evaluates the catalog for `user_id` and awards every newly qualified badge.
///
/// Returns the badges awarded by this call. Any store failure is logged and yields an
/// empty list; the next trigger re-evaluates from scratch.
#[tracing::instrument(skip(store, today), fields(trigger = trigger.as_str()))]
pub async fn check_and_award_badges(
    store: &dyn Store,
    today: NaiveDate,
    user_id: Uuid,
    trigger: BadgeTrigger,
) -> Vec<Badge> {
    match award_new_badges(store, today, user_id).await {
        Ok(awarded) => {
            if !awarded.is_empty() {
                tracing::info!(
                    %user_id,
                    count = awarded.len(),
                    badges = ?awarded.iter().map(|b| b.name.as_str()).collect::<Vec<_>>(),
                    "Awarded badges"
                );
            }
            awarded
        }
        Err(e) => {
            tracing::warn!(error = %e, %user_id, "Badge evaluation failed");
            Vec::new()
        }
    }
}

async fn award_new_badges(
    store: &dyn Store,
    today: NaiveDate,
    user_id: Uuid,
) -> StoreResult<Vec<Badge>> {
    let (stats, catalog, earned) = tokio::try_join!(
        collect_badge_stats(store, today, user_id),
        store.badge_catalog(),
        store.earned_badge_ids(user_id),
    )?;

    let candidates = newly_qualified(&catalog, &earned, &stats);
    if candidates.is_empty() {
        return Ok(candidates);
    }

    let earned_at = Utc::now();
    let rows: Vec<UserBadge> = candidates
        .iter()
        .map(|badge| UserBadge {
            user_id,
            badge_id: badge.id,
            earned_at,
        })
        .collect();

    // A concurrent evaluation may have written some of these pairs first
    let inserted = store.insert_user_badges(&rows).await?;
    if inserted.len() < rows.len() {
        tracing::debug!(
            %user_id,
            inserted = inserted.len(),
            attempted = rows.len(),
            "Some qualifying badges were already held"
        );
    }

    Ok(candidates
        .into_iter()
        .filter(|badge| inserted.contains(&badge.id))
        .collect())
}

/// Badges the user holds, oldest first, joined with their catalog entries.
pub async fn get_user_badges(store: &dyn Store, user_id: Uuid) -> StoreResult<Vec<EarnedBadge>> {
    let (catalog, held) = tokio::try_join!(store.badge_catalog(), store.user_badges(user_id))?;
    let by_id: HashMap<Uuid, Badge> = catalog.into_iter().map(|b| (b.id, b)).collect();

    Ok(held
        .into_iter()
        .filter_map(|ub| {
            by_id.get(&ub.badge_id).map(|badge| EarnedBadge {
                badge: badge.clone(),
                earned_at: ub.earned_at,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::badge::default_catalog;
    use crate::models::log_entry::LogEntry;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn badge(requirement_type: RequirementType, requirement_value: i32) -> Badge {
        Badge {
            id: Uuid::new_v4(),
            name: format!("{requirement_type:?} {requirement_value}"),
            description: String::new(),
            icon: "*".into(),
            category: "test".into(),
            requirement_type,
            requirement_value,
        }
    }

    #[test]
    fn streak_badge_accepts_current_or_longest() {
        let five = badge(RequirementType::DailyStreak, 5);

        let only_longest = BadgeStats {
            current_streak: 0,
            longest_streak: 5,
            ..BadgeStats::default()
        };
        let only_current = BadgeStats {
            current_streak: 5,
            longest_streak: 4,
            ..BadgeStats::default()
        };
        let neither = BadgeStats {
            current_streak: 4,
            longest_streak: 4,
            ..BadgeStats::default()
        };

        assert!(qualifies(&five, &only_longest));
        assert!(qualifies(&five, &only_current));
        assert!(!qualifies(&five, &neither));
    }

    #[test]
    fn threshold_is_inclusive() {
        let stats = BadgeStats {
            posts: 10,
            locations: 4,
            followers: 10,
            total_likes: 99,
            ..BadgeStats::default()
        };
        assert!(qualifies(&badge(RequirementType::Posts, 10), &stats));
        assert!(!qualifies(&badge(RequirementType::Locations, 5), &stats));
        assert!(qualifies(&badge(RequirementType::Followers, 10), &stats));
        assert!(!qualifies(&badge(RequirementType::TotalLikes, 100), &stats));
    }

    #[test]
    fn earned_badges_are_not_candidates() {
        let catalog = vec![badge(RequirementType::Posts, 1), badge(RequirementType::Posts, 2)];
        let earned: HashSet<Uuid> = [catalog[0].id].into_iter().collect();
        let stats = BadgeStats {
            posts: 5,
            ..BadgeStats::default()
        };

        let fresh = newly_qualified(&catalog, &earned, &stats);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].id, catalog[1].id);
    }

    #[tokio::test]
    async fn awards_once_and_is_idempotent() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let today = date(2024, 6, 4);
        for d in 2..=4 {
            store
                .insert_log(LogEntry::new(user, date(2024, 6, d), "entry").with_location("Lisbon"))
                .await;
        }

        let first = check_and_award_badges(&store, today, user, BadgeTrigger::LogCreated).await;
        let names: Vec<&str> = first.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"First Step"));
        assert!(names.contains(&"On a Roll"));

        let second = check_and_award_badges(&store, today, user, BadgeTrigger::Manual).await;
        assert!(second.is_empty());
        assert_eq!(store.user_badges(user).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn stale_streak_still_awards_from_longest_run() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        for d in 1..=3 {
            store
                .insert_log(LogEntry::new(user, date(2024, 1, d), "entry"))
                .await;
        }

        let awarded =
            check_and_award_badges(&store, date(2024, 6, 15), user, BadgeTrigger::Manual).await;
        assert!(awarded.iter().any(|b| b.name == "On a Roll"));
    }

    #[tokio::test]
    async fn followers_and_likes_drive_social_badges() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let log = store
            .insert_log(LogEntry::new(user, date(2024, 5, 1), "popular"))
            .await;
        for _ in 0..10 {
            let fan = Uuid::new_v4();
            store.add_follow(fan, user).await;
            store.add_like(log, fan).await;
        }

        let awarded =
            check_and_award_badges(&store, date(2024, 6, 1), user, BadgeTrigger::FollowerGained)
                .await;
        let names: Vec<&str> = awarded.iter().map(|b| b.name.as_str()).collect();
        assert!(names.contains(&"Making Friends"));
        assert!(names.contains(&"Well Liked"));
        assert!(!names.contains(&"Influencer"));
    }

    #[tokio::test]
    async fn failed_insert_is_swallowed_and_retried_later() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let today = date(2024, 6, 4);
        store.insert_log(LogEntry::new(user, today, "entry")).await;

        store.set_reject_inserts(true);
        let awarded = check_and_award_badges(&store, today, user, BadgeTrigger::LogCreated).await;
        assert!(awarded.is_empty());
        assert!(store.user_badges(user).await.unwrap().is_empty());

        store.set_reject_inserts(false);
        let awarded = check_and_award_badges(&store, today, user, BadgeTrigger::LogCreated).await;
        assert_eq!(awarded.len(), 1);
    }

    #[tokio::test]
    async fn badges_held_before_the_insert_are_not_reported_again() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let today = date(2024, 6, 4);
        let first_step = default_catalog()[0].clone();
        store
            .insert_user_badges(&[UserBadge {
                user_id: user,
                badge_id: first_step.id,
                earned_at: Utc::now(),
            }])
            .await
            .unwrap();
        for d in 2..=4 {
            store
                .insert_log(LogEntry::new(user, date(2024, 6, d), "entry"))
                .await;
        }

        // Earned set read before a concurrent award of "First Step" landed
        store.set_stale_earned_reads(true);
        let awarded = check_and_award_badges(&store, today, user, BadgeTrigger::LogCreated).await;
        let names: Vec<&str> = awarded.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["On a Roll"]);
        assert_eq!(store.user_badges(user).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn offline_store_awards_nothing() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let awarded =
            check_and_award_badges(&store, date(2024, 6, 4), Uuid::new_v4(), BadgeTrigger::Manual)
                .await;
        assert!(awarded.is_empty());
    }

    #[tokio::test]
    async fn user_badges_join_catalog_entries() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let first_step = default_catalog()[0].clone();
        store
            .insert_user_badges(&[UserBadge {
                user_id: user,
                badge_id: first_step.id,
                earned_at: Utc::now(),
            }])
            .await
            .unwrap();

        let earned = get_user_badges(&store, user).await.unwrap();
        assert_eq!(earned.len(), 1);
        assert_eq!(earned[0].badge, first_step);
    }
}
