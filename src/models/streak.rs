use chrono::NaiveDate;
use serde::Serialize;

/// Current and longest run of consecutive posting days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Streaks {
    pub current: u32,
    pub longest: u32,
}

/// Streak view for a single user. Derived on demand, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreakData {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_post_date: Option<NaiveDate>,
    pub is_active_today: bool,
}
