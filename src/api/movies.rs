use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult,
    models::{CatalogItem, Genre, Paginated, SearchRequest},
};

use super::{ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub struct ItemKindQuery {
    #[serde(default)]
    pub is_show: bool,
}

/// Search the catalog by free-text query or discovery filters
pub async fn search(
    State(state): State<AppState>,
    Query(request): Query<SearchRequest>,
) -> AppResult<Json<ApiResponse<Paginated<CatalogItem>>>> {
    let page = state.catalog.search(request).await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// Full details for one item, including trailer and streaming info
pub async fn details(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(kind): Query<ItemKindQuery>,
) -> AppResult<Json<ApiResponse<CatalogItem>>> {
    let item = state.catalog.details(id, kind.is_show).await?;
    Ok(Json(ApiResponse::ok(item)))
}

/// Personalized recommendations for one user
pub async fn recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> AppResult<Json<ApiResponse<Vec<CatalogItem>>>> {
    let recommendations = state.engine.recommendations_for(user_id).await?;
    Ok(Json(ApiResponse::ok(recommendations)))
}

/// The combined movie + TV genre list
pub async fn genres(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Genre>>>> {
    let genres = state.catalog.genres().await?;
    Ok(Json(ApiResponse::ok(genres)))
}

/// Items similar to the given one
pub async fn similar(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(kind): Query<ItemKindQuery>,
) -> AppResult<Json<ApiResponse<Vec<CatalogItem>>>> {
    let items = state.catalog.similar(id, kind.is_show).await?;
    Ok(Json(ApiResponse::ok(items)))
}
