//! Per-habit overview and dashboard summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::habit_stats::{HabitStats, HabitStatsCalculator};
use crate::habit::{CheckIn, Habit};

/// A habit together with its computed progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitOverview {
    pub habit: Habit,
    pub stats: HabitStats,
    /// A check-in exists on today's calendar day
    pub completed_today: bool,
}

impl HabitOverview {
    pub fn build(
        calculator: &HabitStatsCalculator,
        habit: Habit,
        check_ins: &[CheckIn],
        now: DateTime<Utc>,
    ) -> Self {
        let stats = calculator.compute_for(&habit, check_ins, now);
        let completed_today = calculator.completed_on_day_of(check_ins, now);
        Self {
            habit,
            stats,
            completed_today,
        }
    }
}

/// Totals shown at the top of the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_habits: u32,
    pub completed_today: u32,
    /// Percentage of habits completed today
    pub overall_progress: u8,
    /// Highest current streak across habits
    pub best_streak: u32,
}

impl DashboardSummary {
    pub fn from_overviews(overviews: &[HabitOverview]) -> Self {
        let total_habits = overviews.len() as u32;
        if total_habits == 0 {
            return Self::default();
        }

        let completed_today = overviews.iter().filter(|o| o.completed_today).count() as u32;
        let best_streak = overviews
            .iter()
            .map(|o| o.stats.current_streak)
            .max()
            .unwrap_or(0);
        let overall_progress =
            ((200 * u64::from(completed_today) + u64::from(total_habits))
                / (2 * u64::from(total_habits))) as u8;

        Self {
            total_habits,
            completed_today,
            overall_progress,
            best_streak,
        }
    }
}

/// Dashboard payload: summary plus every habit's overview.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dashboard {
    pub summary: DashboardSummary,
    pub habits: Vec<HabitOverview>,
}

impl Dashboard {
    pub fn new(habits: Vec<HabitOverview>) -> Self {
        Self {
            summary: DashboardSummary::from_overviews(&habits),
            habits,
        }
    }
}
