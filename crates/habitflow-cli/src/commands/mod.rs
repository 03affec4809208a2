pub mod checkin;
pub mod config;
pub mod habit;
pub mod stats;
