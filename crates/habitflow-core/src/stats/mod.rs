//! Statistics module for HabitFlow
//!
//! Streak and completion-rate analytics for individual habits, plus the
//! dashboard summary built on top of them.

mod dashboard;
mod habit_stats;

pub use habit_stats::{compute_stats, HabitStats, HabitStatsCalculator, StatsConfig};

pub use dashboard::{Dashboard, DashboardSummary, HabitOverview};
