pub mod achievements;
pub mod recap;
pub mod streak;
