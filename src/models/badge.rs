use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Statistic a badge threshold is measured against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "badge_requirement", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequirementType {
    Posts,
    Locations,
    Followers,
    TotalLikes,
    DailyStreak,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Badge {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: String,
    pub requirement_type: RequirementType,
    pub requirement_value: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct UserBadge {
    pub user_id: Uuid,
    pub badge_id: Uuid,
    pub earned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EarnedBadge {
    #[serde(flatten)]
    pub badge: Badge,
    pub earned_at: DateTime<Utc>,
}

/// What caused a badge evaluation. Only used for logging.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BadgeTrigger {
    LogCreated,
    LikeGiven,
    FollowerGained,
    #[default]
    Manual,
}

impl BadgeTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LogCreated => "log_created",
            Self::LikeGiven => "like_given",
            Self::FollowerGained => "follower_gained",
            Self::Manual => "manual",
        }
    }
}

/// Counters a badge catalog is evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BadgeStats {
    pub posts: i64,
    pub locations: i64,
    pub followers: i64,
    pub total_likes: i64,
    pub current_streak: u32,
    pub longest_streak: u32,
}

// Keep in sync with the seed rows in migrations/20240601000000_init.sql
const DEFAULT_CATALOG: &[(u128, &str, &str, &str, &str, RequirementType, i32)] = &[
    (1, "First Step", "Write your first log", "✍️", "journaling", RequirementType::Posts, 1),
    (2, "Storyteller", "Write 10 logs", "📖", "journaling", RequirementType::Posts, 10),
    (3, "Chronicler", "Write 50 logs", "📚", "journaling", RequirementType::Posts, 50),
    (4, "Centurion", "Write 100 logs", "🏛️", "journaling", RequirementType::Posts, 100),
    (5, "Explorer", "Log from 5 different places", "🧭", "travel", RequirementType::Locations, 5),
    (6, "Globetrotter", "Log from 20 different places", "🌍", "travel", RequirementType::Locations, 20),
    (7, "Making Friends", "Gain 10 followers", "🤝", "social", RequirementType::Followers, 10),
    (8, "Influencer", "Gain 100 followers", "⭐", "social", RequirementType::Followers, 100),
    (9, "Well Liked", "Receive 10 likes", "❤️", "social", RequirementType::TotalLikes, 10),
    (10, "Crowd Favorite", "Receive 100 likes", "💖", "social", RequirementType::TotalLikes, 100),
    (11, "On a Roll", "Post 3 days in a row", "🔥", "streak", RequirementType::DailyStreak, 3),
    (12, "Week Warrior", "Post 7 days in a row", "📅", "streak", RequirementType::DailyStreak, 7),
    (13, "Unstoppable", "Post 30 days in a row", "🏆", "streak", RequirementType::DailyStreak, 30),
];

/// Ids are `00000000-0000-4000-8000-0000000000NN`, matching the migration seed.
pub fn default_catalog() -> Vec<Badge> {
    DEFAULT_CATALOG
        .iter()
        .map(|&(n, name, description, icon, category, requirement_type, requirement_value)| Badge {
            id: Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0000 | n),
            name: name.into(),
            description: description.into(),
            icon: icon.into(),
            category: category.into(),
            requirement_type,
            requirement_value,
        })
        .collect()
}
