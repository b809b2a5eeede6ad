use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const TOP_POSTS_LIMIT: i64 = 5;
pub const PHOTO_HIGHLIGHTS_LIMIT: i64 = 9;

/// Per-(user, year) aggregate produced by the store's `get_year_recap_stats`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct YearRecapStats {
    pub total_logs: i64,
    pub unique_locations: i64,
    pub total_photos: i64,
    pub unique_trips: i64,
    pub first_log_date: Option<NaiveDate>,
    pub last_log_date: Option<NaiveDate>,
    pub busiest_month: Option<u32>,
    pub total_likes: i64,
    pub total_comments: i64,
    pub top_location: Option<String>,
    #[serde(default)]
    pub top_location_count: i64,
    /// Month number (1-12) to log count.
    #[serde(default)]
    pub month_breakdown: BTreeMap<u32, i64>,
}

impl YearRecapStats {
    /// All twelve months in order, zero-filled.
    pub fn months(&self) -> Vec<MonthCount> {
        (1..=12)
            .map(|month| MonthCount {
                month,
                count: self.month_breakdown.get(&month).copied().unwrap_or(0),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct MonthCount {
    pub month: u32,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct TopPost {
    pub id: Uuid,
    pub title: String,
    pub event_date: NaiveDate,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub like_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct PhotoHighlight {
    pub id: Uuid,
    pub title: String,
    pub event_date: NaiveDate,
    pub image_url: String,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Everything a recap needs, fetched in one pass.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct YearRecapData {
    pub stats: YearRecapStats,
    pub top_posts: Vec<TopPost>,
    pub locations: Vec<String>,
    pub trips: Vec<String>,
    pub photos: Vec<PhotoHighlight>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ShareCard {
    pub title: String,
    pub text: String,
}

pub const SLIDE_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlideKind {
    Intro,
    Stats,
    Locations,
    Trips,
    Timeline,
    Photos,
    Engagement,
    Outro,
}

impl SlideKind {
    pub const ORDER: [SlideKind; SLIDE_COUNT] = [
        SlideKind::Intro,
        SlideKind::Stats,
        SlideKind::Locations,
        SlideKind::Trips,
        SlideKind::Timeline,
        SlideKind::Photos,
        SlideKind::Engagement,
        SlideKind::Outro,
    ];
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Slide {
    Intro {
        year: i32,
        total_logs: i64,
        first_log_date: Option<NaiveDate>,
    },
    Stats {
        total_logs: i64,
        total_photos: i64,
        unique_locations: i64,
        unique_trips: i64,
    },
    Locations {
        unique_locations: i64,
        top_location: Option<String>,
        top_location_count: i64,
        locations: Vec<String>,
    },
    Trips {
        unique_trips: i64,
        trips: Vec<String>,
    },
    Timeline {
        months: Vec<MonthCount>,
        busiest_month: Option<u32>,
        busiest_month_name: Option<&'static str>,
        first_log_date: Option<NaiveDate>,
        last_log_date: Option<NaiveDate>,
    },
    Photos {
        total_photos: i64,
        highlights: Vec<PhotoHighlight>,
    },
    Engagement {
        total_likes: i64,
        total_comments: i64,
        top_posts: Vec<TopPost>,
    },
    Outro {
        year: i32,
        total_logs: i64,
        share: ShareCard,
    },
}

impl Slide {
    pub fn kind(&self) -> SlideKind {
        match self {
            Slide::Intro { .. } => SlideKind::Intro,
            Slide::Stats { .. } => SlideKind::Stats,
            Slide::Locations { .. } => SlideKind::Locations,
            Slide::Trips { .. } => SlideKind::Trips,
            Slide::Timeline { .. } => SlideKind::Timeline,
            Slide::Photos { .. } => SlideKind::Photos,
            Slide::Engagement { .. } => SlideKind::Engagement,
            Slide::Outro { .. } => SlideKind::Outro,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecapSlideSet {
    pub year: i32,
    pub slides: [Slide; SLIDE_COUNT],
}
