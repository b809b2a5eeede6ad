pub mod badges;
pub mod health;
pub mod recap;
pub mod streaks;
