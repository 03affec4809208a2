//! Habit progress analytics.
//!
//! Given a habit's periodicity, creation time and check-in history, computes
//! the current streak, the longest streak, a completion-rate percentage and
//! the total number of completions. The computation is pure: "now" is an
//! argument and nothing is cached between calls.
//!
//! Timestamps are truncated to calendar days in the configured timezone
//! before any gap is measured. Continuity between two neighbouring check-ins
//! (newest first):
//! - **Daily**: a gap of exactly 1 day extends the run; a gap of 0 days
//!   (same-day duplicate) keeps the run alive without extending it;
//!   anything else breaks it.
//! - **Weekly**: a gap of up to 7 days extends the run.
//!
//! A streak is only *current* when the newest check-in lies in the current
//! period: today for daily habits, the last 7 days (today included) for
//! weekly habits.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::habit::{CheckIn, Frequency, Habit};

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;
const WEEKLY_MAX_GAP_DAYS: i64 = 7;
const WEEKLY_CURRENT_PERIOD_DAYS: i64 = 6;

/// Progress statistics for one habit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitStats {
    /// Consecutive completed periods ending now (0 once lapsed)
    pub current_streak: u32,
    /// Longest run ever observed
    pub longest_streak: u32,
    /// Completions over expected opportunities, percent in [0, 100]
    pub completion_rate: u8,
    /// Number of check-ins supplied
    pub total_completions: u32,
}

/// Day boundary used when deciding what "today" means.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Offset from UTC in minutes for the user's calendar day
    pub timezone_offset_minutes: i32,
}

/// How a check-in relates to the next older one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Continuity {
    /// The older check-in belongs to the previous period; the run grows.
    Extends,
    /// Same-day duplicate of a daily habit; the run neither grows nor breaks.
    SamePeriod,
    Broken,
}

fn continuity(frequency: Frequency, gap_days: i64) -> Continuity {
    match frequency {
        Frequency::Daily => match gap_days {
            0 => Continuity::SamePeriod,
            1 => Continuity::Extends,
            _ => Continuity::Broken,
        },
        Frequency::Weekly if gap_days <= WEEKLY_MAX_GAP_DAYS => Continuity::Extends,
        Frequency::Weekly => Continuity::Broken,
    }
}

fn in_current_period(frequency: Frequency, gap_days: i64) -> bool {
    match frequency {
        Frequency::Daily => gap_days == 0,
        Frequency::Weekly => gap_days <= WEEKLY_CURRENT_PERIOD_DAYS,
    }
}

/// Compute stats with the day boundary at UTC midnight.
///
/// Check-ins may be passed in any order. An empty history yields all zeros.
pub fn compute_stats(
    frequency: Frequency,
    created_at: DateTime<Utc>,
    check_ins: &[DateTime<Utc>],
    now: DateTime<Utc>,
) -> HabitStats {
    HabitStatsCalculator::new().compute(frequency, created_at, check_ins, now)
}

/// Analytics engine with a configurable day boundary.
#[derive(Debug, Clone, Default)]
pub struct HabitStatsCalculator {
    config: StatsConfig,
}

impl HabitStatsCalculator {
    /// Create a calculator using UTC days.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a calculator with a custom day boundary.
    pub fn with_config(config: StatsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StatsConfig {
        &self.config
    }

    fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.config.timezone_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| {
                tracing::warn!(
                    offset_minutes = self.config.timezone_offset_minutes,
                    "timezone offset out of range, using UTC"
                );
                Utc.fix()
            })
    }

    /// Calendar day of `at` in the configured timezone.
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset()).date_naive()
    }

    /// Instant at which the calendar day containing `now` began.
    pub fn start_of_day(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.day_bounds(self.local_date(now)).0
    }

    /// Half-open UTC range `[start, end)` covering a local calendar day.
    pub fn day_bounds(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let midnight = date.and_time(NaiveTime::MIN);
        let start = self
            .offset()
            .from_local_datetime(&midnight)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| midnight.and_utc());
        (start, start + Duration::days(1))
    }

    /// Compute stats for a history. Never fails.
    pub fn compute(
        &self,
        frequency: Frequency,
        created_at: DateTime<Utc>,
        check_ins: &[DateTime<Utc>],
        now: DateTime<Utc>,
    ) -> HabitStats {
        if check_ins.is_empty() {
            return HabitStats::default();
        }

        let mut sorted = check_ins.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));

        let (latest_run, longest_streak) = self.runs(frequency, &sorted);

        let since_today = self.days_between(now, sorted[0]);
        let current_streak = if in_current_period(frequency, since_today) {
            latest_run
        } else {
            0
        };

        let total_completions = u32::try_from(check_ins.len()).unwrap_or(u32::MAX);
        let completion_rate =
            Self::completion_rate(frequency, created_at, now, total_completions);

        tracing::debug!(
            %frequency,
            total = total_completions,
            current = current_streak,
            longest = longest_streak,
            rate = completion_rate,
            "computed habit stats"
        );

        HabitStats {
            current_streak,
            longest_streak,
            completion_rate,
            total_completions,
        }
    }

    /// Compute stats for a loaded habit and its check-in records.
    pub fn compute_for(
        &self,
        habit: &Habit,
        check_ins: &[CheckIn],
        now: DateTime<Utc>,
    ) -> HabitStats {
        let timestamps: Vec<DateTime<Utc>> =
            check_ins.iter().map(|c| c.completed_at).collect();
        self.compute(habit.frequency, habit.created_at, &timestamps, now)
    }

    /// Whether any check-in falls on the calendar day containing `now`.
    pub fn completed_on_day_of(&self, check_ins: &[CheckIn], now: DateTime<Utc>) -> bool {
        let today = self.local_date(now);
        check_ins
            .iter()
            .any(|c| self.local_date(c.completed_at) == today)
    }

    /// Calendar days from the day of `earlier` to the day of `later`.
    pub fn days_between(&self, later: DateTime<Utc>, earlier: DateTime<Utc>) -> i64 {
        (self.local_date(later) - self.local_date(earlier)).num_days()
    }

    /// Returns (run containing the newest check-in, longest run).
    /// `sorted` must be newest first and non-empty.
    fn runs(&self, frequency: Frequency, sorted: &[DateTime<Utc>]) -> (u32, u32) {
        let mut run = 1u32;
        let mut longest = 0u32;
        let mut latest: Option<u32> = None;

        for pair in sorted.windows(2) {
            let gap_days = self.days_between(pair[0], pair[1]);
            match continuity(frequency, gap_days) {
                Continuity::Extends => run += 1,
                Continuity::SamePeriod => {}
                Continuity::Broken => {
                    longest = longest.max(run);
                    latest.get_or_insert(run);
                    run = 1;
                }
            }
        }

        // The oldest run is never flushed inside the loop.
        longest = longest.max(run);
        (latest.unwrap_or(run), longest)
    }

    fn completion_rate(
        frequency: Frequency,
        created_at: DateTime<Utc>,
        now: DateTime<Utc>,
        total: u32,
    ) -> u8 {
        let elapsed_ms = (now - created_at).num_milliseconds();
        let elapsed_days =
            elapsed_ms.div_euclid(MS_PER_DAY) + i64::from(elapsed_ms.rem_euclid(MS_PER_DAY) != 0);

        let expected = match frequency {
            Frequency::Daily => elapsed_days,
            Frequency::Weekly => elapsed_days.div_euclid(7),
        };
        let denominator = expected.max(1) as u64;

        // Round half up without going through floats.
        let rate = (200 * u64::from(total) + denominator) / (2 * denominator);
        rate.min(100) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    fn ago(days: i64) -> DateTime<Utc> {
        now() - Duration::days(days)
    }

    fn history(days: &[i64]) -> Vec<DateTime<Utc>> {
        days.iter().map(|&d| ago(d)).collect()
    }

    #[test]
    fn empty_history_is_all_zero() {
        for frequency in Frequency::ALL {
            for created in [ago(0), ago(30), ago(400)] {
                let stats = compute_stats(frequency, created, &[], now());
                assert_eq!(stats, HabitStats::default());
            }
        }
    }

    #[test]
    fn daily_three_consecutive_days() {
        let stats = compute_stats(Frequency::Daily, ago(10), &history(&[0, 1, 2]), now());
        assert_eq!(stats.current_streak, 3);
        assert_eq!(stats.longest_streak, 3);
        assert_eq!(stats.total_completions, 3);
    }

    #[test]
    fn daily_gap_splits_runs() {
        let stats = compute_stats(Frequency::Daily, ago(10), &history(&[0, 1, 5]), now());
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.longest_streak, 2);
    }

    #[test]
    fn current_streak_is_the_newest_run_not_the_longest() {
        // Newest run: today only. Older run: 4 days.
        let stats = compute_stats(
            Frequency::Daily,
            ago(20),
            &history(&[0, 3, 4, 5, 6]),
            now(),
        );
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.longest_streak, 4);
    }

    #[test]
    fn weekly_seven_day_spacing_is_continuous() {
        let stats = compute_stats(Frequency::Weekly, ago(28), &history(&[0, 7, 14, 21]), now());
        assert_eq!(stats.current_streak, 4);
        assert_eq!(stats.longest_streak, 4);
    }

    #[test]
    fn weekly_eight_day_gap_breaks() {
        let stats = compute_stats(Frequency::Weekly, ago(28), &history(&[0, 8, 15]), now());
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.longest_streak, 2);
    }

    #[test]
    fn lapsed_daily_streak_keeps_longest() {
        let stats = compute_stats(
            Frequency::Daily,
            ago(30),
            &history(&[2, 3, 4, 5, 6]),
            now(),
        );
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.longest_streak, 5);
    }

    #[test]
    fn daily_streak_is_not_current_without_todays_check_in() {
        let stats = compute_stats(Frequency::Daily, ago(10), &history(&[1, 2]), now());
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.longest_streak, 2);
    }

    #[test]
    fn daily_gaps_use_calendar_days_not_elapsed_hours() {
        // 23:30 yesterday and 00:30 today are one calendar day apart.
        let late = Utc.with_ymd_and_hms(2024, 1, 14, 23, 30, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2024, 1, 15, 0, 30, 0).unwrap();
        let stats = compute_stats(Frequency::Daily, ago(5), &[early, late], now());
        assert_eq!(stats.current_streak, 2);

        // 00:30 yesterday and 23:30 yesterday are the same day.
        let same_day = Utc.with_ymd_and_hms(2024, 1, 14, 0, 30, 0).unwrap();
        let stats = compute_stats(Frequency::Daily, ago(5), &[late, same_day], now());
        assert_eq!(stats.longest_streak, 1);
    }

    #[test]
    fn daily_gap_is_measured_between_calendar_days() {
        // 36h apart but two calendar days apart: the run breaks.
        let older = Utc.with_ymd_and_hms(2024, 1, 13, 20, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
        let stats = compute_stats(Frequency::Daily, ago(5), &[newer, older], now());
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.longest_streak, 1);
    }

    #[test]
    fn weekly_same_day_check_ins_extend_the_run() {
        let check_ins = vec![ago(0), ago(0) - Duration::hours(2)];
        let stats = compute_stats(Frequency::Weekly, ago(14), &check_ins, now());
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.longest_streak, 2);
        assert_eq!(stats.total_completions, 2);
    }

    #[test]
    fn weekly_current_period_boundary() {
        let live = compute_stats(Frequency::Weekly, ago(60), &history(&[6, 13]), now());
        assert_eq!(live.current_streak, 2);

        let lapsed = compute_stats(Frequency::Weekly, ago(60), &history(&[7, 14]), now());
        assert_eq!(lapsed.current_streak, 0);
        assert_eq!(lapsed.longest_streak, 2);
    }

    #[test]
    fn same_day_duplicates_do_not_inflate_daily_streak() {
        let mut check_ins = history(&[0, 1, 2]);
        check_ins.push(ago(1) + Duration::hours(2));
        check_ins.push(ago(0) - Duration::hours(3));

        let stats = compute_stats(Frequency::Daily, ago(10), &check_ins, now());
        assert_eq!(stats.current_streak, 3);
        assert_eq!(stats.longest_streak, 3);
        assert_eq!(stats.total_completions, 5);
    }

    #[test]
    fn completion_rate_clamps_at_100() {
        let mut check_ins = Vec::new();
        for day in 0..10 {
            check_ins.push(ago(day));
            check_ins.push(ago(day) - Duration::hours(1));
        }
        let stats = compute_stats(Frequency::Daily, ago(10), &check_ins, now());
        assert_eq!(stats.completion_rate, 100);
        assert_eq!(stats.total_completions, 20);
        assert_eq!(stats.longest_streak, 10);
    }

    #[test]
    fn completion_rate_daily() {
        let stats = compute_stats(Frequency::Daily, ago(10), &history(&[0, 1, 2, 3, 4]), now());
        assert_eq!(stats.completion_rate, 50);
    }

    #[test]
    fn completion_rate_rounds_half_up() {
        // 1 of 8 = 12.5%
        let stats = compute_stats(Frequency::Daily, ago(8), &history(&[0]), now());
        assert_eq!(stats.completion_rate, 13);
        // 2 of 3 = 66.7%
        let stats = compute_stats(Frequency::Daily, ago(3), &history(&[0, 1]), now());
        assert_eq!(stats.completion_rate, 67);
    }

    #[test]
    fn elapsed_days_round_up() {
        // 9.5 days counts as 10 opportunities.
        let created = ago(9) - Duration::hours(12);
        let stats = compute_stats(Frequency::Daily, created, &history(&[0]), now());
        assert_eq!(stats.completion_rate, 10);
    }

    #[test]
    fn completion_rate_weekly() {
        let stats = compute_stats(Frequency::Weekly, ago(28), &history(&[0]), now());
        assert_eq!(stats.completion_rate, 25);
    }

    #[test]
    fn new_habit_denominator_is_at_least_one() {
        let stats = compute_stats(Frequency::Weekly, ago(3), &history(&[0]), now());
        assert_eq!(stats.completion_rate, 100);

        let stats = compute_stats(Frequency::Daily, now(), &[now()], now());
        assert_eq!(stats.completion_rate, 100);
        assert_eq!(stats.current_streak, 1);
    }

    #[test]
    fn input_order_does_not_matter() {
        let ordered = history(&[0, 1, 2, 5, 6]);
        let mut shuffled = ordered.clone();
        shuffled.reverse();
        shuffled.swap(0, 2);

        assert_eq!(
            compute_stats(Frequency::Daily, ago(10), &ordered, now()),
            compute_stats(Frequency::Daily, ago(10), &shuffled, now())
        );
    }

    #[test]
    fn compute_is_idempotent() {
        let calculator = HabitStatsCalculator::new();
        let check_ins = history(&[0, 1, 3, 4, 5]);
        let first = calculator.compute(Frequency::Daily, ago(7), &check_ins, now());
        let second = calculator.compute(Frequency::Daily, ago(7), &check_ins, now());
        assert_eq!(first, second);
    }

    #[test]
    fn start_of_day_respects_offset() {
        let utc = HabitStatsCalculator::new();
        assert_eq!(
            utc.start_of_day(now()),
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
        );

        let tokyo = HabitStatsCalculator::with_config(StatsConfig {
            timezone_offset_minutes: 9 * 60,
        });
        // 12:00Z is 21:00 local; local midnight is 15:00Z the previous day.
        assert_eq!(
            tokyo.start_of_day(now()),
            Utc.with_ymd_and_hms(2024, 1, 14, 15, 0, 0).unwrap()
        );
    }

    #[test]
    fn day_bounds_cover_one_local_day() {
        let tokyo = HabitStatsCalculator::with_config(StatsConfig {
            timezone_offset_minutes: 9 * 60,
        });
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let (start, end) = tokyo.day_bounds(date);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 14, 15, 0, 0).unwrap());
        assert_eq!(end - start, Duration::days(1));
    }

    #[test]
    fn out_of_range_offset_falls_back_to_utc() {
        let calculator = HabitStatsCalculator::with_config(StatsConfig {
            timezone_offset_minutes: 48 * 60,
        });
        assert_eq!(
            calculator.start_of_day(now()),
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn completed_today_uses_local_calendar_day() {
        let late_evening_utc = Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap();
        let check_ins = vec![CheckIn {
            id: 1,
            habit_id: "h".to_string(),
            completed_at: late_evening_utc,
        }];
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 20, 0, 0).unwrap();

        assert!(HabitStatsCalculator::new().completed_on_day_of(&check_ins, now));

        // At +09:00 the check-in was on the 15th, but now is the 16th.
        let tokyo = HabitStatsCalculator::with_config(StatsConfig {
            timezone_offset_minutes: 9 * 60,
        });
        assert!(!tokyo.completed_on_day_of(&check_ins, now));
    }

    #[test]
    fn days_between_counts_calendar_days() {
        let calculator = HabitStatsCalculator::new();
        assert_eq!(calculator.days_between(now(), now() - Duration::hours(13)), 1);
        assert_eq!(calculator.days_between(now(), now() - Duration::hours(11)), 0);
    }

    #[test]
    fn stats_serialize_as_plain_integers() {
        let stats = compute_stats(Frequency::Daily, ago(2), &history(&[0, 1]), now());
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["current_streak"], 2);
        assert_eq!(json["completion_rate"], 100);
    }
}
