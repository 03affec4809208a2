//! Check-in commands for CLI.

use chrono::{DateTime, NaiveDate, Utc};
use clap::Subcommand;
use habitflow_core::{Config, Database};

#[derive(Subcommand)]
pub enum CheckinAction {
    /// Record a completion
    Add {
        /// Habit ID
        habit_id: String,
        /// Completion time as RFC 3339 (default: now)
        #[arg(long)]
        at: Option<String>,
    },
    /// Remove the completion recorded on a day
    Undo {
        /// Habit ID
        habit_id: String,
        /// Day as YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// List completions, oldest first
    List {
        /// Habit ID
        habit_id: String,
    },
    /// Check in today, or undo today's check-in if there is one
    Toggle {
        /// Habit ID
        habit_id: String,
    },
}

fn parse_at(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid --at '{value}': {e}"))
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("invalid --date '{value}': {e}"))
}

pub fn run(action: CheckinAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let calc = config.calculator();
    let owner = config.user.id.as_str();
    let now = Utc::now();

    match action {
        CheckinAction::Add { habit_id, at } => {
            let at = at.as_deref().map(parse_at).transpose()?.unwrap_or(now);
            let check_in = db.check_in(owner, &habit_id, at, &calc)?;
            println!("Checked in: {}", calc.local_date(check_in.completed_at));
            println!("{}", serde_json::to_string_pretty(&check_in)?);
        }
        CheckinAction::Undo { habit_id, date } => {
            let day = match date {
                Some(date) => parse_date(&date)?,
                None => calc.local_date(now),
            };
            db.undo_check_in(owner, &habit_id, day, &calc)?;
            println!("Check-in removed: {day}");
        }
        CheckinAction::List { habit_id } => {
            let check_ins = db.list_check_ins(owner, &habit_id)?;
            println!("{}", serde_json::to_string_pretty(&check_ins)?);
        }
        CheckinAction::Toggle { habit_id } => {
            let check_ins = db.list_check_ins(owner, &habit_id)?;
            let today = calc.local_date(now);
            if calc.completed_on_day_of(&check_ins, now) {
                db.undo_check_in(owner, &habit_id, today, &calc)?;
                println!("Check-in removed: {today}");
            } else {
                db.check_in(owner, &habit_id, now, &calc)?;
                println!("Checked in: {today}");
            }
            let overview = db.habit_overview(owner, &habit_id, &calc, now)?;
            println!("{}", serde_json::to_string_pretty(&overview.stats)?);
        }
    }
    Ok(())
}
