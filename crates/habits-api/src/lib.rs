pub mod analytics;
pub mod auth;
pub mod clock;
pub mod error;
pub mod extract;
pub mod habits;
pub mod password;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};
use tracing::error;

use habits_db::Database;

use crate::analytics::LongestStreakScope;
use crate::clock::Clock;
use crate::error::ApiError;
use crate::password::PasswordHashing;

pub type AppState = Arc<AppStateInner>;

/// Everything a handler needs, built once at startup and shared by `Arc`.
pub struct AppStateInner {
    pub db: Database,
    pub passwords: PasswordHashing,
    pub clock: Arc<dyn Clock>,
    pub streak_scope: LongestStreakScope,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/signup/", post(auth::signup))
        .route("/auth/login/", get(auth::login))
        .route("/habits/", post(habits::create_habit).get(habits::list_habits))
        .route("/habits/event/", post(habits::create_event))
        .route("/habits/{habit_id}", put(habits::update_habit).delete(habits::delete_habit))
        .route("/habits/{habit_id}/checkoff", put(habits::checkoff_habit))
        .route("/habits/{habit_id}/events/", get(habits::list_events))
        .route("/habits/{habit_id}/streak/", get(habits::streak))
        .route("/habits/{habit_id}/is_broken/", get(habits::is_broken))
        .route("/analytics/habits/", get(analytics::list_habits))
        .route(
            "/analytics/habits/periodicity/{periodicity}",
            get(analytics::habits_by_periodicity),
        )
        .route("/analytics/habits/longest_streak/", get(analytics::longest_streak))
        .route(
            "/analytics/habits/{habit_id}/longest_streak/",
            get(analytics::habit_longest_streak),
        )
        .with_state(state)
}

/// Run blocking store (and hashing) work off the async runtime.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("background task failed"))
        })?
}
