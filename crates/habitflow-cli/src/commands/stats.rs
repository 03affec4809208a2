use chrono::Utc;
use clap::Subcommand;
use habitflow_core::{Config, Database};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Streaks and completion rate of one habit
    Show {
        /// Habit ID
        habit_id: String,
    },
    /// All habits with today's summary
    Dashboard,
}

pub fn run(action: StatsAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let calc = config.calculator();
    let owner = config.user.id.as_str();

    match action {
        StatsAction::Show { habit_id } => {
            let overview = db.habit_overview(owner, &habit_id, &calc, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&overview)?);
        }
        StatsAction::Dashboard => {
            let dashboard = db.dashboard(owner, &calc, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&dashboard)?);
        }
    }
    Ok(())
}
