use axum::{Json, extract::State};
use tracing::{info, warn};

use habits_types::User;
use habits_types::api::{LoginQuery, MessageResponse, SignupRequest};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::{AppState, run_blocking};

const EMAIL_TAKEN: &str = "Email already registered";

pub async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<Json<User>, ApiError> {
    validate_signup(&req)?;

    let user = run_blocking(&state, move |state| {
        // Checked first so a taken email skips the hash; the UNIQUE
        // constraint still catches a concurrent signup.
        if state.db.get_user_by_email(&req.email)?.is_some() {
            return Err(ApiError::Conflict(EMAIL_TAKEN.into()));
        }

        let password_hash = state.passwords.hash(&req.password)?;

        state
            .db
            .create_user(&req.first_name, &req.last_name, &req.email, &password_hash)?
            .ok_or_else(|| ApiError::Conflict(EMAIL_TAKEN.into()))
    })
    .await?;

    info!("User {} signed up", user.id);
    Ok(Json(user.into()))
}

/// Stateless credential check. No token or session is issued.
pub async fn login(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LoginQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let verified = run_blocking(&state, move |state| {
        let Some(user) = state.db.get_user_by_email(&query.email)? else {
            return Ok(state.passwords.reject_unknown(&query.password));
        };
        Ok(state.passwords.verify(&query.password, &user.password_hash))
    })
    .await?;

    if !verified {
        warn!("Rejected login attempt");
        return Err(ApiError::InvalidCredentials);
    }

    Ok(Json(MessageResponse {
        message: "Login successful".into(),
    }))
}

fn validate_signup(req: &SignupRequest) -> Result<(), ApiError> {
    if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
        return Err(ApiError::BadRequest("First and last name are required".into()));
    }
    if !req.email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address".into()));
    }
    if req.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".into()));
    }
    Ok(())
}
