//! Habit domain model.
//!
//! Frequency and category are closed enumerations. Strings coming from the
//! outside (CLI flags, stored rows, JSON) are parsed into them and rejected
//! when unknown; nothing is silently defaulted.

mod validation;

pub use validation::{HabitDraft, HabitUpdate, MAX_NAME_LEN};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Colour assigned to habits created without one.
pub const DEFAULT_COLOR: &str = "#3b82f6";

/// Periodicity of a habit. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// One completion expected per calendar day.
    Daily,
    /// One completion expected per 7-day window.
    Weekly,
}

impl Frequency {
    pub const ALL: [Frequency; 2] = [Frequency::Daily, Frequency::Weekly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "" => Err(ValidationError::Required("Frequency is required".to_string())),
            _ => Err(ValidationError::UnknownVariant {
                field: "frequency".to_string(),
                value: s.to_string(),
                expected: "daily, weekly".to_string(),
            }),
        }
    }
}

/// Habit category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Health,
    Study,
    Personal,
    Work,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Health,
        Category::Study,
        Category::Personal,
        Category::Work,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Health => "health",
            Category::Study => "study",
            Category::Personal => "personal",
            Category::Work => "work",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "health" => Ok(Category::Health),
            "study" => Ok(Category::Study),
            "personal" => Ok(Category::Personal),
            "work" => Ok(Category::Work),
            "" => Err(ValidationError::Required("Category is required".to_string())),
            _ => Err(ValidationError::UnknownVariant {
                field: "category".to_string(),
                value: s.to_string(),
                expected: "health, study, personal, work".to_string(),
            }),
        }
    }
}

/// A tracked habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    /// Unique identifier
    pub id: String,
    /// Subject that owns the habit
    pub owner_id: String,
    pub name: String,
    pub frequency: Frequency,
    pub category: Category,
    #[serde(default)]
    pub notes: Option<String>,
    pub color: String,
    /// Anchors the completion-rate denominator
    pub created_at: DateTime<Utc>,
}

/// A single completion of a habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckIn {
    pub id: i64,
    pub habit_id: String,
    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_parses_known_values_case_insensitively() {
        assert_eq!("daily".parse::<Frequency>().unwrap(), Frequency::Daily);
        assert_eq!(" Weekly ".parse::<Frequency>().unwrap(), Frequency::Weekly);
    }

    #[test]
    fn frequency_rejects_unknown_values() {
        let err = "monthly".parse::<Frequency>().unwrap_err();
        assert!(matches!(err, ValidationError::UnknownVariant { .. }));

        let err = "".parse::<Frequency>().unwrap_err();
        assert_eq!(
            err,
            ValidationError::Required("Frequency is required".to_string())
        );
    }

    #[test]
    fn frequency_serde_rejects_unknown_values() {
        assert_eq!(
            serde_json::from_str::<Frequency>("\"weekly\"").unwrap(),
            Frequency::Weekly
        );
        assert!(serde_json::from_str::<Frequency>("\"yearly\"").is_err());
    }

    #[test]
    fn category_roundtrips_through_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert!("leisure".parse::<Category>().is_err());
    }

    #[test]
    fn habit_serializes_enums_lowercase() {
        let habit = Habit {
            id: "h1".to_string(),
            owner_id: "u1".to_string(),
            name: "Read".to_string(),
            frequency: Frequency::Daily,
            category: Category::Study,
            notes: None,
            color: DEFAULT_COLOR.to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&habit).unwrap();
        assert!(json.contains("\"frequency\":\"daily\""));
        assert!(json.contains("\"category\":\"study\""));
    }
}
