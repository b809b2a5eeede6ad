pub mod badge;
pub mod log_entry;
pub mod recap;
pub mod streak;
