use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Periodicity;

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Login is a stateless credential check passed as query parameters.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// -- Habits --

/// Body for both create and update; update replaces all three fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HabitRequest {
    pub name: String,
    pub description: String,
    pub periodicity: Periodicity,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HabitEventRequest {
    pub habit_id: i64,
    /// Defaults to the time the request is handled.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

// -- Analytics --

/// Longest streak over a user's habits with every habit tied at that value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongestStreakResponse {
    pub longest_streak: u32,
    pub habit_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct OptionalUserQuery {
    pub user_id: Option<i64>,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}
