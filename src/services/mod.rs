//! Catalog access and recommendation services.

use crate::{
    error::AppResult,
    models::{CatalogItem, Genre, Paginated, SearchRequest},
};

pub mod recommendations;
pub mod tmdb;

pub use recommendations::RecommendationEngine;
pub use tmdb::TmdbClient;

/// External catalog abstraction
///
/// The recommendation engine and the HTTP handlers talk to the catalog
/// only through this trait, so the TMDB client can be swapped for a
/// test double.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Searches the catalog: a free-text query hits the multi-type
    /// search endpoint, otherwise discovery runs with the optional
    /// year/language/genre filters.
    async fn search(&self, request: SearchRequest) -> AppResult<Paginated<CatalogItem>>;

    /// Fetches an item's full payload, with videos and watch providers
    /// embedded in the same call.
    async fn details(&self, id: i64, is_show: bool) -> AppResult<CatalogItem>;

    /// The movie and TV genre lists unioned, deduplicated by id.
    async fn genres(&self) -> AppResult<Vec<Genre>>;

    /// Items similar to the given one.
    async fn similar(&self, id: i64, is_show: bool) -> AppResult<Vec<CatalogItem>>;
}
