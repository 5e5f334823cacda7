use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Expected cadence of a habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Periodicity {
    Daily,
    Weekly,
}

impl Periodicity {
    /// Largest gap in days between two check-offs that still keeps the
    /// habit going.
    pub fn grace_days(self) -> i64 {
        match self {
            Self::Daily => 1,
            Self::Weekly => 7,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }
}

impl fmt::Display for Periodicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown periodicity '{0}' (expected 'daily' or 'weekly')")]
pub struct UnknownPeriodicity(pub String);

impl FromStr for Periodicity {
    type Err = UnknownPeriodicity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            other => Err(UnknownPeriodicity(other.to_string())),
        }
    }
}

/// Public view of a user. The password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub periodicity: Periodicity,
    pub created_at: DateTime<Utc>,
    pub owner_id: i64,
}

/// A single check-off of a habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitEvent {
    pub id: i64,
    pub habit_id: i64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periodicity_wire_format_is_lowercase() {
        assert_eq!(serde_json::to_string(&Periodicity::Daily).unwrap(), "\"daily\"");
        let weekly: Periodicity = serde_json::from_str("\"weekly\"").unwrap();
        assert_eq!(weekly, Periodicity::Weekly);
        assert!(serde_json::from_str::<Periodicity>("\"monthly\"").is_err());
    }

    #[test]
    fn periodicity_parses_from_column_text() {
        assert_eq!("daily".parse::<Periodicity>(), Ok(Periodicity::Daily));
        assert_eq!(
            "Daily".parse::<Periodicity>(),
            Err(UnknownPeriodicity("Daily".into()))
        );
    }

    #[test]
    fn grace_windows() {
        assert_eq!(Periodicity::Daily.grace_days(), 1);
        assert_eq!(Periodicity::Weekly.grace_days(), 7);
    }
}
