use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub mod tmdb;

/// Unified representation of a movie or TV show, regardless of which
/// upstream payload shape it was mapped from.
///
/// Lightweight search/discover results carry no runtime, trailer,
/// streaming info or genre names; those fields stay `None` until a
/// details fetch fills them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: i64,
    pub is_show: bool,
    pub title: String,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<i32>,
    pub genres: Option<Vec<String>>,
    pub vote_average: f64,
    pub vote_count: i64,
    pub popularity: f64,
    pub poster_path: Option<String>,
    pub trailer_url: Option<String>,
    pub streaming_info: Option<Vec<StreamingOption>>,
}

/// Where a title can be streamed in one country
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingOption {
    pub country: String,
    pub provider_name: String,
    pub logo_url: Option<String>,
}

/// A genre as defined by the external catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Unions the movie and TV genre lists, deduplicating by id.
/// When both lists define the same id, the first occurrence wins.
pub fn merge_genres(movie_genres: Vec<Genre>, tv_genres: Vec<Genre>) -> Vec<Genre> {
    let mut seen = HashSet::new();
    movie_genres
        .into_iter()
        .chain(tv_genres)
        .filter(|genre| seen.insert(genre.id))
        .collect()
}

/// Search criteria for the catalog: either a free-text query (multi-type
/// search) or discovery filters (year/language/genre).
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub year: Option<i32>,
    pub language: Option<String>,
    pub genre_id: Option<i64>,
    #[serde(default = "default_page")]
    pub page: i32,
}

fn default_page() -> i32 {
    1
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: None,
            year: None,
            language: None,
            genre_id: None,
            page: 1,
        }
    }
}

/// One page of catalog results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub page: i32,
    pub total_pages: i32,
    pub total_results: i64,
    pub results: Vec<T>,
}

/// A registered user
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A user's rating of one catalog item
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserRating {
    pub user_id: i32,
    pub item_id: i64,
    pub is_show: bool,
    pub score: f64,
    pub rated_at: DateTime<Utc>,
}

/// A cross-user top-rated item, aggregated from everyone else's ratings
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TopRatedItem {
    pub item_id: i64,
    pub is_show: bool,
    pub average_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genre(id: i64, name: &str) -> Genre {
        Genre {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_merge_genres_dedupes_by_id() {
        let movie = vec![genre(28, "Action"), genre(12, "Adventure")];
        let tv = vec![genre(28, "Action & Adventure"), genre(16, "Animation")];

        let merged = merge_genres(movie, tv);

        assert_eq!(merged.len(), 3);
        // First occurrence wins for the shared id
        assert_eq!(merged[0], genre(28, "Action"));
        assert_eq!(merged[1], genre(12, "Adventure"));
        assert_eq!(merged[2], genre(16, "Animation"));
    }

    #[test]
    fn test_merge_genres_empty_lists() {
        assert!(merge_genres(vec![], vec![]).is_empty());

        let merged = merge_genres(vec![], vec![genre(35, "Comedy")]);
        assert_eq!(merged, vec![genre(35, "Comedy")]);
    }

    #[test]
    fn test_search_request_defaults_to_first_page() {
        let request = SearchRequest::default();
        assert_eq!(request.page, 1);
        assert!(request.query.is_none());
        assert!(request.genre_id.is_none());
    }

    #[test]
    fn test_search_request_query_string_deserialization() {
        let request: SearchRequest =
            serde_json::from_str(r#"{"genre_id": 28, "year": 2010}"#).unwrap();
        assert_eq!(request.genre_id, Some(28));
        assert_eq!(request.year, Some(2010));
        assert_eq!(request.page, 1);
    }
}
