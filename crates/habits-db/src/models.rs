//! Database row types — these map directly to SQLite rows.
//! Kept apart from the habits-types API models so the password hash stays
//! inside the store layer.

use chrono::{DateTime, Utc};
use habits_types::{Habit, HabitEvent, Periodicity, User};

pub struct UserRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
}

pub struct HabitRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub periodicity: Periodicity,
    pub created_at: DateTime<Utc>,
    pub owner_id: i64,
}

pub struct EventRow {
    pub id: i64,
    pub habit_id: i64,
    pub timestamp: DateTime<Utc>,
}

/// A habit together with the timestamps of all its check-offs, oldest first.
pub struct HabitHistory {
    pub habit: HabitRow,
    pub timestamps: Vec<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
        }
    }
}

impl From<HabitRow> for Habit {
    fn from(row: HabitRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            periodicity: row.periodicity,
            created_at: row.created_at,
            owner_id: row.owner_id,
        }
    }
}

impl From<EventRow> for HabitEvent {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id,
            habit_id: row.habit_id,
            timestamp: row.timestamp,
        }
    }
}
