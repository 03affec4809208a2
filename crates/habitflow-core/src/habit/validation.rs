//! Boundary validation for habit input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Category, Frequency, Habit, DEFAULT_COLOR};
use crate::error::ValidationError;

pub const MAX_NAME_LEN: usize = 100;

/// Unvalidated habit input, as received from a form or the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HabitDraft {
    pub name: String,
    pub frequency: String,
    pub category: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl HabitDraft {
    /// Validate the draft and build a new habit for `owner_id`.
    ///
    /// # Errors
    /// Returns the first validation failure: blank or overlong name,
    /// missing or unknown frequency, missing or unknown category.
    pub fn validate(
        self,
        owner_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Habit, ValidationError> {
        let name = validate_name(&self.name)?;
        let frequency: Frequency = self.frequency.parse()?;
        let category: Category = self.category.parse()?;

        Ok(Habit {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            name,
            frequency,
            category,
            notes: normalize_notes(self.notes),
            color: self
                .color
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            created_at,
        })
    }
}

/// Partial update of an existing habit. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HabitUpdate {
    #[serde(default)]
    pub name: Option<String>,
    /// Accepted only when it matches the current frequency.
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl HabitUpdate {
    /// Apply the update to `habit` in place.
    ///
    /// # Errors
    /// Fails without modifying `habit` if any field is invalid or the
    /// update tries to change the frequency.
    pub fn apply(self, habit: &mut Habit) -> Result<(), ValidationError> {
        if let Some(freq) = &self.frequency {
            if freq.parse::<Frequency>()? != habit.frequency {
                return Err(ValidationError::FrequencyImmutable);
            }
        }

        let name = self.name.as_deref().map(validate_name).transpose()?;
        let category = self
            .category
            .as_deref()
            .map(str::parse::<Category>)
            .transpose()?;

        if let Some(name) = name {
            habit.name = name;
        }
        if let Some(category) = category {
            habit.category = category;
        }
        if self.notes.is_some() {
            habit.notes = normalize_notes(self.notes);
        }
        if let Some(color) = self.color {
            let color = color.trim();
            if !color.is_empty() {
                habit.color = color.to_string();
            }
        }
        Ok(())
    }
}

fn validate_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::Required("Habit name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }
    Ok(name.to_string())
}

// Blank notes are stored as absent.
fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}
