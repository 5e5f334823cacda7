use axum::{Json, extract::State};
use tracing::info;

use habits_streak::{is_broken as habit_is_broken, longest_streak};
use habits_types::api::{HabitEventRequest, HabitRequest, UserQuery};
use habits_types::{Habit, HabitEvent};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::{AppState, run_blocking};

pub async fn create_habit(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserQuery>,
    ApiJson(req): ApiJson<HabitRequest>,
) -> Result<Json<Habit>, ApiError> {
    let created_at = state.clock.now();

    let habit = run_blocking(&state, move |state| {
        state
            .db
            .create_habit(query.user_id, &req.name, &req.description, req.periodicity, created_at)?
            .ok_or(ApiError::NotFound("User"))
    })
    .await?;

    Ok(Json(habit.into()))
}

pub async fn list_habits(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<Vec<Habit>>, ApiError> {
    let rows = run_blocking(&state, move |state| Ok(state.db.list_habits(query.user_id)?)).await?;
    Ok(Json(rows.into_iter().map(Habit::from).collect()))
}

/// Full replace of name, description and periodicity.
pub async fn update_habit(
    State(state): State<AppState>,
    ApiPath(habit_id): ApiPath<i64>,
    ApiJson(req): ApiJson<HabitRequest>,
) -> Result<Json<Habit>, ApiError> {
    let habit = run_blocking(&state, move |state| {
        state
            .db
            .update_habit(habit_id, &req.name, &req.description, req.periodicity)?
            .ok_or(ApiError::NotFound("Habit"))
    })
    .await?;

    info!("Updated habit {}", habit_id);
    Ok(Json(habit.into()))
}

pub async fn checkoff_habit(
    State(state): State<AppState>,
    ApiPath(habit_id): ApiPath<i64>,
) -> Result<Json<Habit>, ApiError> {
    let at = state.clock.now();

    let habit = run_blocking(&state, move |state| {
        state
            .db
            .checkoff_habit(habit_id, at)?
            .ok_or(ApiError::NotFound("Habit"))
    })
    .await?;

    info!("Checked off habit {}", habit_id);
    Ok(Json(habit.into()))
}

pub async fn delete_habit(
    State(state): State<AppState>,
    ApiPath(habit_id): ApiPath<i64>,
) -> Result<Json<Habit>, ApiError> {
    let habit = run_blocking(&state, move |state| {
        state
            .db
            .delete_habit(habit_id)?
            .ok_or(ApiError::NotFound("Habit"))
    })
    .await?;

    Ok(Json(habit.into()))
}

/// Record a raw event. Without a timestamp the event is stamped "now".
pub async fn create_event(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<HabitEventRequest>,
) -> Result<Json<HabitEvent>, ApiError> {
    let at = req.timestamp.unwrap_or_else(|| state.clock.now());

    let event = run_blocking(&state, move |state| {
        state
            .db
            .create_event(req.habit_id, at)?
            .ok_or(ApiError::NotFound("Habit"))
    })
    .await?;

    Ok(Json(event.into()))
}

pub async fn list_events(
    State(state): State<AppState>,
    ApiPath(habit_id): ApiPath<i64>,
) -> Result<Json<Vec<HabitEvent>>, ApiError> {
    let rows = run_blocking(&state, move |state| {
        state
            .db
            .list_events(habit_id)?
            .ok_or(ApiError::NotFound("Habit"))
    })
    .await?;

    Ok(Json(rows.into_iter().map(HabitEvent::from).collect()))
}

/// Longest streak of the habit, honouring its periodicity.
pub async fn streak(
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

    Ok(Json(longest_streak(&history.timestamps, history.habit.periodicity)))
}

pub async fn is_broken(
    State(state): State<AppState>,
    ApiPath(habit_id): ApiPath<i64>,
) -> Result<Json<bool>, ApiError> {
    let today = state.clock.now().date_naive();

    let history = run_blocking(&state, move |state| {
        state
            .db
            .habit_history(habit_id)?
            .ok_or(ApiError::NotFound("Habit"))
    })
    .await?;

    Ok(Json(habit_is_broken(
        &history.timestamps,
        history.habit.periodicity,
        today,
    )))
}
