use serde::Serialize;
use uuid::Uuid;

use crate::db::Store;
use crate::models::log_entry::YearRange;
use crate::models::recap::{
    RecapSlideSet, ShareCard, Slide, SlideKind, YearRecapData, YearRecapStats,
    PHOTO_HIGHLIGHTS_LIMIT, SLIDE_COUNT, TOP_POSTS_LIMIT,
};

/// Result of assembling a recap. "No logs that year" and "could not fetch" are
/// deliberately different outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecapOutcome {
    Ready(YearRecapData),
    NoData,
    Unavailable,
}

/// Fetches the five recap views for (`user_id`, `year`) concurrently.
///
/// All five are required: if any fetch fails the outcome is [`RecapOutcome::Unavailable`].
/// An absent aggregate means the user has no logs that year.
pub async fn get_full_year_recap(store: &dyn Store, user_id: Uuid, year: i32) -> RecapOutcome {
    let Some(range) = YearRange::new(year) else {
        return RecapOutcome::NoData;
    };

    let fetched = tokio::try_join!(
        store.year_recap_stats(user_id, year),
        store.top_posts(user_id, range, TOP_POSTS_LIMIT),
        store.distinct_locations(user_id, range),
        store.distinct_trips(user_id, range),
        store.photo_highlights(user_id, range, PHOTO_HIGHLIGHTS_LIMIT),
    );

    match fetched {
        Ok((Some(stats), top_posts, locations, trips, photos)) => {
            RecapOutcome::Ready(YearRecapData {
                stats,
                top_posts,
                locations,
                trips,
                photos,
            })
        }
        Ok((None, ..)) => {
            tracing::debug!(%user_id, year, "No logs for recap year");
            RecapOutcome::NoData
        }
        Err(e) => {
            tracing::warn!(error = %e, %user_id, year, "Failed to fetch year recap");
            RecapOutcome::Unavailable
        }
    }
}

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn month_name(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTH_NAMES.get(index).copied()
}

fn plural(count: i64, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Title and text used when the recap is shared or exported.
pub fn share_card(stats: &YearRecapStats, year: i32) -> ShareCard {
    let mut text = format!(
        "My {year} in review: {}, {} and {}.",
        plural(stats.total_logs, "log"),
        plural(stats.unique_locations, "place"),
        plural(stats.total_photos, "photo"),
    );
    if let Some(top) = stats.top_location.as_deref() {
        text.push_str(&format!(" Most visited: {top}."));
    }
    if let Some(month) = stats.busiest_month.and_then(month_name) {
        text.push_str(&format!(" Busiest month: {month}."));
    }

    ShareCard {
        title: format!("My {year} Year in Review"),
        text,
    }
}

/// Projects recap data into the eight slides, always in the same order.
pub fn build_slide_sequence(data: &YearRecapData, year: i32) -> RecapSlideSet {
    let stats = &data.stats;

    let slides = [
        Slide::Intro {
            year,
            total_logs: stats.total_logs,
            first_log_date: stats.first_log_date,
        },
        Slide::Stats {
            total_logs: stats.total_logs,
            total_photos: stats.total_photos,
            unique_locations: stats.unique_locations,
            unique_trips: stats.unique_trips,
        },
        Slide::Locations {
            unique_locations: stats.unique_locations,
            top_location: stats.top_location.clone(),
            top_location_count: stats.top_location_count,
            locations: data.locations.clone(),
        },
        Slide::Trips {
            unique_trips: stats.unique_trips,
            trips: data.trips.clone(),
        },
        Slide::Timeline {
            months: stats.months(),
            busiest_month: stats.busiest_month,
            busiest_month_name: stats.busiest_month.and_then(month_name),
            first_log_date: stats.first_log_date,
            last_log_date: stats.last_log_date,
        },
        Slide::Photos {
            total_photos: stats.total_photos,
            highlights: data.photos.clone(),
        },
        Slide::Engagement {
            total_likes: stats.total_likes,
            total_comments: stats.total_comments,
            top_posts: data.top_posts.clone(),
        },
        Slide::Outro {
            year,
            total_logs: stats.total_logs,
            share: share_card(stats, year),
        },
    ];

    RecapSlideSet { year, slides }
}

/// Position within a slide set. Moves are clamped to the first and last slide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SlideCursor {
    index: usize,
}

impl SlideCursor {
    pub const LAST: usize = SLIDE_COUNT - 1;

    pub fn at(index: usize) -> Self {
        Self {
            index: index.min(Self::LAST),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn kind(&self) -> SlideKind {
        SlideKind::ORDER[self.index]
    }

    pub fn next(&mut self) {
        self.index = (self.index + 1).min(Self::LAST);
    }

    pub fn prev(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    pub fn jump(&mut self, index: usize) {
        self.index = index.min(Self::LAST);
    }

    pub fn has_prev(&self) -> bool {
        self.index > 0
    }

    pub fn has_next(&self) -> bool {
        self.index < Self::LAST
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::log_entry::LogEntry;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn empty_data() -> YearRecapData {
        YearRecapData {
            stats: YearRecapStats {
                total_logs: 1,
                unique_locations: 0,
                total_photos: 0,
                unique_trips: 0,
                first_log_date: Some(date(2024, 2, 1)),
                last_log_date: Some(date(2024, 2, 1)),
                busiest_month: Some(2),
                total_likes: 0,
                total_comments: 0,
                top_location: None,
                top_location_count: 0,
                month_breakdown: BTreeMap::from([(2, 1)]),
            },
            top_posts: vec![],
            locations: vec![],
            trips: vec![],
            photos: vec![],
        }
    }

    #[test]
    fn always_eight_slides_in_fixed_order() {
        let set = build_slide_sequence(&empty_data(), 2024);
        let kinds: Vec<SlideKind> = set.slides.iter().map(Slide::kind).collect();
        assert_eq!(kinds, SlideKind::ORDER.to_vec());

        match &set.slides[4] {
            Slide::Timeline {
                months,
                busiest_month_name,
                ..
            } => {
                assert_eq!(months.len(), 12);
                assert_eq!(months[1].count, 1);
                assert_eq!(months[11].count, 0);
                assert_eq!(*busiest_month_name, Some("February"));
            }
            other => panic!("expected timeline slide, got {other:?}"),
        }
    }

    #[test]
    fn share_card_mentions_top_location() {
        let mut data = empty_data();
        data.stats.total_logs = 3;
        data.stats.unique_locations = 2;
        data.stats.top_location = Some("Paris".into());

        let card = share_card(&data.stats, 2024);
        assert_eq!(card.title, "My 2024 Year in Review");
        assert!(card.text.starts_with("My 2024 in review: 3 logs, 2 places and 0 photos."));
        assert!(card.text.contains("Most visited: Paris."));
        assert!(card.text.contains("Busiest month: February."));
    }

    #[test]
    fn month_names_are_bounded() {
        assert_eq!(month_name(1), Some("January"));
        assert_eq!(month_name(12), Some("December"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
    }

    #[test]
    fn cursor_clamps_without_wrapping() {
        let mut cursor = SlideCursor::default();
        cursor.prev();
        assert_eq!(cursor.index(), 0);
        assert!(!cursor.has_prev());

        cursor.jump(42);
        assert_eq!(cursor.index(), SlideCursor::LAST);
        assert_eq!(cursor.kind(), SlideKind::Outro);
        cursor.next();
        assert_eq!(cursor.index(), SlideCursor::LAST);
        assert!(!cursor.has_next());

        cursor.prev();
        assert_eq!(cursor.kind(), SlideKind::Engagement);
        assert_eq!(SlideCursor::at(3).kind(), SlideKind::Trips);
    }

    #[tokio::test]
    async fn recap_for_empty_year_is_no_data() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store
            .insert_log(LogEntry::new(user, date(2023, 5, 5), "last year"))
            .await;

        assert_eq!(get_full_year_recap(&store, user, 2024).await, RecapOutcome::NoData);
    }

    #[tokio::test]
    async fn recap_fetch_failure_is_unavailable() {
        let store = MemoryStore::new();
        store.set_offline(true);
        assert_eq!(
            get_full_year_recap(&store, Uuid::new_v4(), 2024).await,
            RecapOutcome::Unavailable
        );
    }

    #[tokio::test]
    async fn recap_bundles_all_views() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let base = Utc.with_ymd_and_hms(2024, 12, 1, 12, 0, 0).unwrap();

        let paris = store
            .insert_log(
                LogEntry::new(user, date(2024, 4, 1), "Paris day one")
                    .with_location("Paris")
                    .with_trip("Europe")
                    .with_image("photos/a.jpg")
                    .created_at(base),
            )
            .await;
        let paris_two = store
            .insert_log(
                LogEntry::new(user, date(2024, 4, 2), "Paris day two")
                    .with_location("Paris")
                    .with_trip("Europe")
                    .created_at(base + Duration::hours(1)),
            )
            .await;
        store
            .insert_log(
                LogEntry::new(user, date(2024, 9, 9), "Tokyo")
                    .with_location("Tokyo")
                    .with_image("photos/b.jpg")
                    .created_at(base + Duration::hours(2)),
            )
            .await;
        // outside the year
        store
            .insert_log(LogEntry::new(user, date(2025, 1, 1), "New year").with_location("Oslo"))
            .await;

        for _ in 0..3 {
            store.add_like(paris_two, Uuid::new_v4()).await;
        }
        store.add_like(paris, Uuid::new_v4()).await;
        store.add_comment(paris, Uuid::new_v4()).await;

        let RecapOutcome::Ready(data) = get_full_year_recap(&store, user, 2024).await else {
            panic!("expected a recap");
        };

        assert_eq!(data.stats.total_logs, 3);
        assert_eq!(data.stats.unique_locations, 2);
        assert_eq!(data.stats.top_location.as_deref(), Some("Paris"));
        assert_eq!(data.stats.top_location_count, 2);
        assert_eq!(data.stats.total_likes, 4);
        assert_eq!(data.stats.total_comments, 1);
        assert_eq!(data.locations, vec!["Paris".to_string(), "Tokyo".to_string()]);
        assert_eq!(data.trips, vec!["Europe".to_string()]);
        assert_eq!(data.top_posts[0].id, paris_two);
        assert_eq!(data.top_posts[0].like_count, 3);
        assert_eq!(data.top_posts.len(), 3);
        assert_eq!(data.photos.len(), 2);
        assert_eq!(data.photos[0].title, "Tokyo");

        // Unchanged data gives an identical recap
        assert_eq!(
            get_full_year_recap(&store, user, 2024).await,
            RecapOutcome::Ready(data)
        );
    }

    #[tokio::test]
    async fn top_post_ties_are_deterministic() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let mut ids = Vec::new();
        for title in ["a", "b", "c"] {
            ids.push(
                store
                    .insert_log(LogEntry::new(user, date(2024, 7, 1), title))
                    .await,
            );
        }
        ids.sort();

        let RecapOutcome::Ready(data) = get_full_year_recap(&store, user, 2024).await else {
            panic!("expected a recap");
        };
        let ranked: Vec<Uuid> = data.top_posts.iter().map(|p| p.id).collect();
        assert_eq!(ranked, ids);
    }
}
