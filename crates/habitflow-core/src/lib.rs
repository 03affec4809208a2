//! # HabitFlow Core Library
//!
//! Core business logic for the HabitFlow habit tracker. The CLI binary is a
//! thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Habit model**: closed enums for frequency and category, validated at
//!   the input boundary
//! - **Analytics**: a pure engine computing current/longest streak and
//!   completion rate from a check-in history
//! - **Storage**: SQLite-based habit and check-in storage and TOML-based
//!   configuration
//!
//! ## Key Components
//!
//! - [`HabitStatsCalculator`] / [`compute_stats`]: the analytics engine
//! - [`Database`]: habit and check-in persistence
//! - [`Config`]: application configuration management

pub mod error;
pub mod habit;
pub mod stats;
pub mod storage;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use habit::{Category, CheckIn, Frequency, Habit, HabitDraft, HabitUpdate};
pub use stats::{
    compute_stats, Dashboard, DashboardSummary, HabitOverview, HabitStats, HabitStatsCalculator,
    StatsConfig,
};
pub use storage::{Config, Database};
