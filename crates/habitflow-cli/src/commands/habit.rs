//! Habit management commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use habitflow_core::{Config, Database, HabitDraft, HabitUpdate};

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a new habit
    Create {
        /// Habit name
        name: String,
        /// Frequency: daily or weekly
        #[arg(long)]
        frequency: String,
        /// Category: health, study, personal or work
        #[arg(long)]
        category: String,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
        /// Display colour (defaults to display.color)
        #[arg(long)]
        color: Option<String>,
    },
    /// List habits
    List {
        /// Print JSON instead of one line per habit
        #[arg(long)]
        json: bool,
    },
    /// Get habit details
    Get {
        /// Habit ID
        id: String,
    },
    /// Update a habit
    Update {
        /// Habit ID
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// Frequency (cannot be changed; must match the current one)
        #[arg(long)]
        frequency: Option<String>,
        /// New category
        #[arg(long)]
        category: Option<String>,
        /// New notes (empty string clears them)
        #[arg(long)]
        notes: Option<String>,
        /// New colour
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a habit and its check-ins
    Delete {
        /// Habit ID
        id: String,
    },
}

pub fn run(action: HabitAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let owner = config.user.id.as_str();

    match action {
        HabitAction::Create {
            name,
            frequency,
            category,
            notes,
            color,
        } => {
            let habit = HabitDraft {
                name,
                frequency,
                category,
                notes,
                color: color.or_else(|| Some(config.display.color.clone())),
            }
            .validate(owner, Utc::now())?;
            db.create_habit(&habit)?;
            println!("Habit created: {}", habit.id);
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::List { json } => {
            let habits = db.list_habits(owner)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&habits)?);
            } else if habits.is_empty() {
                println!("No habits yet");
            } else {
                for habit in &habits {
                    println!(
                        "{}  {:<7} {:<9} {}",
                        habit.id,
                        habit.frequency.as_str(),
                        habit.category.as_str(),
                        habit.name
                    );
                }
            }
        }
        HabitAction::Get { id } => {
            let habit = db.get_habit(owner, &id)?;
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::Update {
            id,
            name,
            frequency,
            category,
            notes,
            color,
        } => {
            let mut habit = db.get_habit(owner, &id)?;
            HabitUpdate {
                name,
                frequency,
                category,
                notes,
                color,
            }
            .apply(&mut habit)?;
            db.update_habit(&habit)?;
            println!("Habit updated:");
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::Delete { id } => {
            db.delete_habit(owner, &id)?;
            println!("Habit deleted: {id}");
        }
    }
    Ok(())
}
