use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{
    error::{AppError, AppResult},
    models::{User, UserRating},
    services::CatalogProvider,
};

use super::{ApiResponse, AppState};

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub genre_ids: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize)]
pub struct PreferencesRequest {
    pub genre_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    pub user_id: i32,
    pub item_id: i64,
    pub is_show: bool,
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub genre_preferences: Vec<i64>,
}

impl UserResponse {
    fn from_parts(user: User, genre_preferences: Vec<i64>) -> Self {
        Self {
            id: user.id,
            name: user.name,
            created_at: user.created_at,
            genre_preferences,
        }
    }
}

// Handlers

/// Look up a user by name, case-insensitively
pub async fn get_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let user = state
        .store
        .find_by_name(&name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", name)))?;

    let genre_preferences = state.store.preferred_genres(user.id).await?;

    Ok(Json(ApiResponse::ok(UserResponse::from_parts(
        user,
        genre_preferences,
    ))))
}

/// Register a new user, optionally with initial genre preferences
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("User name is required".to_string()));
    }

    if state.store.find_by_name(name).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "A user named '{}' already exists",
            name
        )));
    }

    let genre_ids = request.genre_ids.unwrap_or_default();
    if !genre_ids.is_empty() {
        validate_genre_ids(state.catalog.as_ref(), &genre_ids).await?;
    }

    let user = state.store.create_user(name, &genre_ids).await?;
    let response = UserResponse::from_parts(user, genre_ids);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(response, "User created")),
    ))
}

/// Replace the user's whole genre preference set
pub async fn replace_preferences(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    Json(request): Json<PreferencesRequest>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let user = state
        .store
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    // Validation happens before any write, so a rejected update leaves
    // the previous preference set untouched
    validate_genre_ids(state.catalog.as_ref(), &request.genre_ids).await?;

    state
        .store
        .replace_preferences(user_id, &request.genre_ids)
        .await?;

    Ok(Json(ApiResponse::ok_with_message(
        UserResponse::from_parts(user, request.genre_ids),
        "Preferences updated",
    )))
}

/// Rate an item, overwriting any previous rating by this user
pub async fn add_rating(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    Json(request): Json<RatingRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    if request.user_id != user_id {
        return Err(AppError::InvalidInput("User id mismatch".to_string()));
    }

    if !(0.0..=10.0).contains(&request.score) {
        return Err(AppError::InvalidInput(
            "Score must be between 0 and 10".to_string(),
        ));
    }

    if state.store.find_by_id(user_id).await?.is_none() {
        return Err(AppError::NotFound(format!("User {} not found", user_id)));
    }

    state
        .store
        .upsert_rating(user_id, request.item_id, request.is_show, request.score)
        .await?;

    Ok(Json(ApiResponse::message_only("Rating saved")))
}

/// All of the user's ratings, newest first
pub async fn list_ratings(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> AppResult<Json<ApiResponse<Vec<UserRating>>>> {
    if state.store.find_by_id(user_id).await?.is_none() {
        return Err(AppError::NotFound(format!("User {} not found", user_id)));
    }

    let ratings = state.store.ratings_for_user(user_id).await?;

    if ratings.is_empty() {
        return Ok(Json(ApiResponse::ok_with_message(
            ratings,
            "No ratings found for this user",
        )));
    }

    Ok(Json(ApiResponse::ok(ratings)))
}

/// Rejects genre ids that are not part of the unioned genre catalog
async fn validate_genre_ids(
    catalog: &dyn CatalogProvider,
    genre_ids: &[i64],
) -> AppResult<()> {
    let known: HashSet<i64> = catalog.genres().await?.into_iter().map(|g| g.id).collect();

    let invalid: Vec<String> = genre_ids
        .iter()
        .filter(|id| !known.contains(id))
        .map(|id| id.to_string())
        .collect();

    if invalid.is_empty() {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!(
            "Invalid genre ids: {}",
            invalid.join(", ")
        )))
    }
}
