use std::str::FromStr;

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};

use habits_streak::{StreakLeaders, longest_streak as habit_longest_streak_of, streak_leaders};
use habits_types::api::{LongestStreakResponse, OptionalUserQuery, UserQuery};
use habits_types::{Habit, Periodicity};

use crate::error::ApiError;
use crate::extract::{ApiPath, ApiQuery};
use crate::{AppState, run_blocking};

/// Which contract `GET /analytics/habits/longest_streak/` serves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LongestStreakScope {
    /// Per user: `{"longest_streak": n, "habit_ids": [...]}`, `user_id` required.
    #[default]
    User,
    /// Every habit in the store: a bare integer, `user_id` ignored.
    Global,
}

impl FromStr for LongestStreakScope {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "global" => Ok(Self::Global),
            other => Err(anyhow::anyhow!(
                "unknown longest streak scope '{}' (expected 'user' or 'global')",
                other
            )),
        }
    }
}

pub async fn list_habits(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<Vec<Habit>>, ApiError> {
    let rows = run_blocking(&state, move |state| Ok(state.db.list_habits(query.user_id)?)).await?;
    Ok(Json(rows.into_iter().map(Habit::from).collect()))
}

pub async fn habits_by_periodicity(
    State(state): State<AppState>,
    ApiPath(periodicity): ApiPath<Periodicity>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<Vec<Habit>>, ApiError> {
    let rows = run_blocking(&state, move |state| {
        Ok(state.db.list_habits_by_periodicity(query.user_id, periodicity)?)
    })
    .await?;

    Ok(Json(rows.into_iter().map(Habit::from).collect()))
}

pub async fn longest_streak(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OptionalUserQuery>,
) -> Result<Response, ApiError> {
    match state.streak_scope {
        LongestStreakScope::User => {
            let user_id = query
                .user_id
                .ok_or_else(|| ApiError::BadRequest("user_id is required".into()))?;
            let leaders = streak_leaders_for(&state, Some(user_id)).await?;
            Ok(Json(LongestStreakResponse {
                longest_streak: leaders.longest_streak,
                habit_ids: leaders.habit_ids,
            })
            .into_response())
        }
        LongestStreakScope::Global => {
            let leaders = streak_leaders_for(&state, None).await?;
            Ok(Json(leaders.longest_streak).into_response())
        }
    }
}

pub async fn habit_longest_streak(
    State(state): State<AppState>,
    ApiPath(habit_id): ApiPath<i64>,
) -> Result<Json<u32>, ApiError> {
    let history = run_blocking(&state, move |state| {
        state
            .db
            .habit_history(habit_id)?
            .ok_or(ApiError::NotFound("Habit"))
    })
    .await?;

    Ok(Json(habit_longest_streak_of(
        &history.timestamps,
        history.habit.periodicity,
    )))
}

async fn streak_leaders_for(
    state: &AppState,
    owner_id: Option<i64>,
) -> Result<StreakLeaders, ApiError> {
    let histories =
        run_blocking(state, move |state| Ok(state.db.habit_histories(owner_id)?)).await?;

    Ok(streak_leaders(histories.iter().map(|h| {
        (h.habit.id, habit_longest_streak_of(&h.timestamps, h.habit.periodicity))
    })))
}
