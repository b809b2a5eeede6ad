use chrono::NaiveDate;
use uuid::Uuid;

use crate::db::Store;
use crate::models::streak::{StreakData, Streaks};

/// Current and longest run of consecutive calendar days in `dates`.
///
/// Input order and duplicates do not matter. The current streak only counts when the most
/// recent date is today or yesterday; otherwise it is 0 while `longest` keeps the best run.
pub fn compute_streaks(dates: &[NaiveDate], today: NaiveDate) -> Streaks {
    let mut unique = dates.to_vec();
    unique.sort_unstable_by(|a, b| b.cmp(a));
    unique.dedup();

    let Some(&most_recent) = unique.first() else {
        return Streaks::default();
    };

    let days_since_most_recent = (today - most_recent).num_days();

    let mut longest = 1u32;
    let mut run = 1u32;
    let mut leading_run: Option<u32> = None;

    for pair in unique.windows(2) {
        if (pair[0] - pair[1]).num_days() == 1 {
            run += 1;
        } else {
            leading_run.get_or_insert(run);
            run = 1;
        }
        longest = longest.max(run);
    }

    let current = if days_since_most_recent <= 1 {
        leading_run.unwrap_or(run)
    } else {
        0
    };

    Streaks { current, longest }
}

/// Streak view for `user_id`. A failed fetch is logged and reads as no activity.
pub async fn get_user_streak(store: &dyn Store, today: NaiveDate, user_id: Uuid) -> StreakData {
    let dates = match store.event_dates(user_id).await {
        Ok(dates) => dates,
        Err(e) => {
            tracing::warn!(error = %e, %user_id, "Failed to fetch event dates for streak");
            return StreakData::default();
        }
    };

    let streaks = compute_streaks(&dates, today);
    let last_post_date = dates.iter().max().copied();

    StreakData {
        current_streak: streaks.current,
        longest_streak: streaks.longest,
        last_post_date,
        is_active_today: last_post_date == Some(today),
    }
}
