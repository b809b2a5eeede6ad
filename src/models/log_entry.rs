use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single dated journal post. The core only ever reads these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub owner: Uuid,
    pub event_date: NaiveDate,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub trip_name: Option<String>,
    pub is_public: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(owner: Uuid, event_date: NaiveDate, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            event_date,
            title: title.into(),
            description: None,
            location: None,
            trip_name: None,
            is_public: false,
            image_url: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_trip(mut self, trip_name: impl Into<String>) -> Self {
        self.trip_name = Some(trip_name.into());
        self
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Inclusive calendar range covering one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub year: i32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl YearRange {
    pub fn new(year: i32) -> Option<Self> {
        Some(Self {
            year,
            start: NaiveDate::from_ymd_opt(year, 1, 1)?,
            end: NaiveDate::from_ymd_opt(year, 12, 31)?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}
