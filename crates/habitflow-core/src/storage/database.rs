//! SQLite-based habit storage.
//!
//! Provides persistent storage for:
//! - Habits, scoped by owner
//! - Check-ins, at most one per habit per calendar day
//!
//! Statistics are never stored; they are recomputed from the loaded history
//! on every request.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::data_dir;
use super::migrations;
use crate::error::{CoreError, DatabaseError, Result, ValidationError};
use crate::habit::{CheckIn, Habit};
use crate::stats::{Dashboard, HabitOverview, HabitStatsCalculator};

/// Raw `habits` row before enum and timestamp decoding.
struct HabitRow {
    id: String,
    owner_id: String,
    name: String,
    frequency: String,
    category: String,
    notes: Option<String>,
    color: String,
    created_at: String,
}

const HABIT_COLUMNS: &str = "id, owner_id, name, frequency, category, notes, color, created_at";

impl HabitRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            name: row.get(2)?,
            frequency: row.get(3)?,
            category: row.get(4)?,
            notes: row.get(5)?,
            color: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}

impl TryFrom<HabitRow> for Habit {
    type Error = DatabaseError;

    fn try_from(row: HabitRow) -> std::result::Result<Self, Self::Error> {
        let frequency = row
            .frequency
            .parse()
            .map_err(|_| invalid_row("frequency", &row.frequency))?;
        let category = row
            .category
            .parse()
            .map_err(|_| invalid_row("category", &row.category))?;

        Ok(Habit {
            created_at: parse_timestamp("created_at", &row.created_at)?,
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            frequency,
            category,
            notes: row.notes,
            color: row.color,
        })
    }
}

fn invalid_row(column: &str, value: &str) -> DatabaseError {
    tracing::warn!(column, value, "rejecting stored row");
    DatabaseError::InvalidRow {
        column: column.to_string(),
        value: value.to_string(),
    }
}

fn parse_timestamp(column: &str, value: &str) -> std::result::Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| invalid_row(column, value))
}

// Fixed-width so lexical order matches chronological order.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// SQLite database for habits and check-ins.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/habitflow.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("habitflow.db");
        Self::open_at(&path)
    }

    /// Open (or create) the database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        tracing::debug!(path = %path.display(), "opened database");
        Ok(db)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        migrations::migrate(&self.conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    /// Insert a validated habit.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn create_habit(&self, habit: &Habit) -> Result<()> {
        self.conn.execute(
            "INSERT INTO habits (id, owner_id, name, frequency, category, notes, color, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                habit.id,
                habit.owner_id,
                habit.name,
                habit.frequency.as_str(),
                habit.category.as_str(),
                habit.notes,
                habit.color,
                format_timestamp(habit.created_at),
            ],
        )?;
        tracing::info!(habit_id = %habit.id, owner_id = %habit.owner_id, "created habit");
        Ok(())
    }

    /// Fetch one habit owned by `owner_id`.
    ///
    /// # Errors
    /// Returns `CoreError::NotFound` if the habit does not exist for this owner.
    pub fn get_habit(&self, owner_id: &str, habit_id: &str) -> Result<Habit> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?1 AND owner_id = ?2"),
                params![habit_id, owner_id],
                HabitRow::from_row,
            )
            .optional()?;

        match row {
            Some(row) => Ok(Habit::try_from(row)?),
            None => Err(CoreError::NotFound(habit_id.to_string())),
        }
    }

    /// List all habits of `owner_id`, oldest first.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored row cannot be decoded.
    pub fn list_habits(&self, owner_id: &str) -> Result<Vec<Habit>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {HABIT_COLUMNS} FROM habits WHERE owner_id = ?1 ORDER BY created_at ASC, id ASC"
        ))?;
        let rows = stmt.query_map(params![owner_id], HabitRow::from_row)?;

        let mut habits = Vec::new();
        for row in rows {
            habits.push(Habit::try_from(row?)?);
        }
        Ok(habits)
    }

    /// Persist the mutable fields of an existing habit.
    ///
    /// Frequency and creation time are never rewritten.
    ///
    /// # Errors
    /// Returns `CoreError::NotFound` if the habit does not exist for its owner.
    pub fn update_habit(&self, habit: &Habit) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE habits SET name = ?1, category = ?2, notes = ?3, color = ?4
             WHERE id = ?5 AND owner_id = ?6",
            params![
                habit.name,
                habit.category.as_str(),
                habit.notes,
                habit.color,
                habit.id,
                habit.owner_id,
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::NotFound(habit.id.clone()));
        }
        tracing::info!(habit_id = %habit.id, "updated habit");
        Ok(())
    }

    /// Delete a habit and all its check-ins.
    ///
    /// # Errors
    /// Returns `CoreError::NotFound` if the habit does not exist for this owner.
    pub fn delete_habit(&self, owner_id: &str, habit_id: &str) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute(
            "DELETE FROM habits WHERE id = ?1 AND owner_id = ?2",
            params![habit_id, owner_id],
        )?;
        if removed == 0 {
            return Err(CoreError::NotFound(habit_id.to_string()));
        }
        let check_ins = tx.execute("DELETE FROM check_ins WHERE habit_id = ?1", params![habit_id])?;
        tx.commit()?;

        tracing::info!(habit_id, check_ins, "deleted habit");
        Ok(())
    }

    /// All check-ins of a habit, oldest first.
    ///
    /// # Errors
    /// Returns `CoreError::NotFound` if the habit does not exist for this owner.
    pub fn list_check_ins(&self, owner_id: &str, habit_id: &str) -> Result<Vec<CheckIn>> {
        // Ownership check doubles as existence check.
        self.get_habit(owner_id, habit_id)?;
        self.check_ins_of(habit_id)
    }

    fn check_ins_of(&self, habit_id: &str) -> Result<Vec<CheckIn>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, habit_id, completed_at FROM check_ins
             WHERE habit_id = ?1
             ORDER BY completed_at ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![habit_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut check_ins = Vec::new();
        for row in rows {
            let (id, habit_id, completed_at) = row?;
            check_ins.push(CheckIn {
                id,
                habit_id,
                completed_at: parse_timestamp("completed_at", &completed_at)?,
            });
        }
        Ok(check_ins)
    }

    /// Record a completion at `at`.
    ///
    /// The calendar day is taken from `calculator`'s timezone.
    ///
    /// # Errors
    /// Returns `ValidationError::AlreadyCheckedIn` if the habit already has a
    /// check-in on that day, `CoreError::NotFound` for unknown habits.
    pub fn check_in(
        &self,
        owner_id: &str,
        habit_id: &str,
        at: DateTime<Utc>,
        calculator: &HabitStatsCalculator,
    ) -> Result<CheckIn> {
        self.get_habit(owner_id, habit_id)?;

        let day = calculator.local_date(at);
        if self.count_on_day(habit_id, day, calculator)? > 0 {
            return Err(ValidationError::AlreadyCheckedIn {
                habit_id: habit_id.to_string(),
                date: day.to_string(),
            }
            .into());
        }

        self.conn.execute(
            "INSERT INTO check_ins (habit_id, completed_at) VALUES (?1, ?2)",
            params![habit_id, format_timestamp(at)],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::info!(habit_id, %day, "checked in");

        Ok(CheckIn {
            id,
            habit_id: habit_id.to_string(),
            completed_at: at,
        })
    }

    /// Remove the check-in recorded on `day`.
    ///
    /// # Errors
    /// Returns `ValidationError::NoCheckIn` if there is nothing to undo.
    pub fn undo_check_in(
        &self,
        owner_id: &str,
        habit_id: &str,
        day: NaiveDate,
        calculator: &HabitStatsCalculator,
    ) -> Result<usize> {
        self.get_habit(owner_id, habit_id)?;

        let (start, end) = calculator.day_bounds(day);
        let removed = self.conn.execute(
            "DELETE FROM check_ins
             WHERE habit_id = ?1 AND completed_at >= ?2 AND completed_at < ?3",
            params![habit_id, format_timestamp(start), format_timestamp(end)],
        )?;
        if removed == 0 {
            return Err(ValidationError::NoCheckIn {
                habit_id: habit_id.to_string(),
                date: day.to_string(),
            }
            .into());
        }

        tracing::info!(habit_id, %day, removed, "undid check-in");
        Ok(removed)
    }

    fn count_on_day(
        &self,
        habit_id: &str,
        day: NaiveDate,
        calculator: &HabitStatsCalculator,
    ) -> Result<u32> {
        let (start, end) = calculator.day_bounds(day);
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM check_ins
             WHERE habit_id = ?1 AND completed_at >= ?2 AND completed_at < ?3",
            params![habit_id, format_timestamp(start), format_timestamp(end)],
            |row| row.get::<_, u32>(0),
        )?;
        Ok(count)
    }

    /// Load a habit with its history and compute its overview.
    ///
    /// # Errors
    /// Returns `CoreError::NotFound` if the habit does not exist for this
    /// owner, or a database error if loading fails.
    pub fn habit_overview(
        &self,
        owner_id: &str,
        habit_id: &str,
        calculator: &HabitStatsCalculator,
        now: DateTime<Utc>,
    ) -> Result<HabitOverview> {
        let habit = self.get_habit(owner_id, habit_id)?;
        let check_ins = self.check_ins_of(habit_id)?;
        Ok(HabitOverview::build(calculator, habit, &check_ins, now))
    }

    /// Overviews of every habit of `owner_id` plus the summary.
    ///
    /// # Errors
    /// Returns an error if loading habits or check-ins fails.
    pub fn dashboard(
        &self,
        owner_id: &str,
        calculator: &HabitStatsCalculator,
        now: DateTime<Utc>,
    ) -> Result<Dashboard> {
        let mut overviews = Vec::new();
        for habit in self.list_habits(owner_id)? {
            let check_ins = self.check_ins_of(&habit.id)?;
            overviews.push(HabitOverview::build(calculator, habit, &check_ins, now));
        }
        Ok(Dashboard::new(overviews))
    }
}
