//! Raw TMDB payload types and their normalization into [`CatalogItem`].
//!
//! Two upstream shapes exist: a lightweight search/discover result and a
//! full details payload (with embedded videos and watch providers). Both
//! map into the same unified [`CatalogItem`]; the mapping is pure and
//! does no I/O. Unexpected or missing upstream fields deserialize as
//! absent rather than failing the whole payload.

use serde::Deserialize;
use std::collections::BTreeMap;

use super::{CatalogItem, Genre, StreamingOption};

/// CDN prefix for provider logo images
const IMAGE_CDN_PREFIX: &str = "https://image.tmdb.org/t/p/w92";

/// Response from `search/multi`, `discover/movie` and `*/similar`
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSearchResponse {
    #[serde(default)]
    pub page: i32,
    #[serde(default)]
    pub results: Vec<TmdbSearchResult>,
    #[serde(default)]
    pub total_pages: i32,
    #[serde(default)]
    pub total_results: i64,
}

/// One lightweight search/discover result.
///
/// Movies carry `title`/`release_date`, TV shows carry
/// `name`/`first_air_date`; `media_type` discriminates on the
/// multi-search endpoint and is absent elsewhere.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSearchResult {
    pub id: i64,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: i64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub poster_path: Option<String>,
}

/// Full details payload from `movie/{id}` or `tv/{id}` with
/// `append_to_response=videos,watch/providers`
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbDetails {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<i32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: i64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub videos: Option<TmdbVideos>,
    #[serde(default, rename = "watch/providers")]
    pub watch_providers: Option<TmdbWatchProviders>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbVideos {
    #[serde(default)]
    pub results: Vec<TmdbVideo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbVideo {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbWatchProviders {
    // BTreeMap keeps the per-country flattening deterministic
    #[serde(default)]
    pub results: BTreeMap<String, TmdbCountryProviders>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCountryProviders {
    #[serde(default)]
    pub flatrate: Option<Vec<TmdbProvider>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbProvider {
    pub provider_name: String,
    #[serde(default)]
    pub logo_path: Option<String>,
}

/// Response from `genre/movie/list` and `genre/tv/list`
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenreResponse {
    #[serde(default)]
    pub genres: Vec<Genre>,
}

impl From<TmdbSearchResult> for CatalogItem {
    /// Maps a multi-search result, deriving the show flag from the
    /// `media_type` discriminator.
    fn from(result: TmdbSearchResult) -> Self {
        let is_show = result.media_type.as_deref() == Some("tv");
        CatalogItem::from_listing(result, is_show)
    }
}

impl CatalogItem {
    /// Maps a lightweight result with a caller-supplied show hint, used
    /// for endpoints whose payloads carry no `media_type` (similar
    /// items). TV shows use the `name`/`first_air_date` fields, movies
    /// use `title`/`release_date`.
    ///
    /// The resolved title may be empty; callers drop such items.
    pub fn from_listing(result: TmdbSearchResult, is_show: bool) -> Self {
        let (title, release_date) = if is_show {
            (result.name, result.first_air_date)
        } else {
            (result.title, result.release_date)
        };

        CatalogItem {
            id: result.id,
            is_show,
            title: title.unwrap_or_default(),
            overview: result.overview,
            release_date,
            runtime: None,
            genres: None,
            vote_average: result.vote_average,
            vote_count: result.vote_count,
            popularity: result.popularity,
            poster_path: result.poster_path,
            trailer_url: None,
            streaming_info: None,
        }
    }

    /// Maps a full details payload. The show flag comes from the caller
    /// (the endpoint hit already encodes movie vs. TV), but the show
    /// name/date fields are preferred whenever the payload carries them.
    pub fn from_details(details: TmdbDetails, is_show: bool) -> Self {
        let trailer_url = details
            .videos
            .as_ref()
            .and_then(|videos| {
                videos
                    .results
                    .iter()
                    .find(|v| v.site == "YouTube" && v.video_type == "Trailer")
            })
            .map(|v| format!("https://www.youtube.com/watch?v={}", v.key));

        let streaming_info = details.watch_providers.as_ref().map(|providers| {
            providers
                .results
                .iter()
                .flat_map(|(country, entry)| {
                    entry.flatrate.iter().flatten().map(move |provider| StreamingOption {
                        country: country.clone(),
                        provider_name: provider.provider_name.clone(),
                        logo_url: provider
                            .logo_path
                            .as_ref()
                            .map(|path| format!("{}{}", IMAGE_CDN_PREFIX, path)),
                    })
                })
                .collect()
        });

        CatalogItem {
            id: details.id,
            is_show,
            title: details.name.or(details.title).unwrap_or_default(),
            overview: details.overview,
            release_date: details.first_air_date.or(details.release_date),
            runtime: details.runtime,
            genres: Some(details.genres.into_iter().map(|g| g.name).collect()),
            vote_average: details.vote_average,
            vote_count: details.vote_count,
            popularity: details.popularity,
            poster_path: details.poster_path,
            trailer_url,
            streaming_info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_result(media_type: Option<&str>) -> TmdbSearchResult {
        TmdbSearchResult {
            id: 550,
            media_type: media_type.map(str::to_string),
            title: Some("Fight Club".to_string()),
            name: Some("Fight Club the Series".to_string()),
            overview: Some("An insomniac office worker".to_string()),
            release_date: Some("1999-10-15".to_string()),
            first_air_date: Some("2020-01-01".to_string()),
            genre_ids: vec![18],
            vote_average: 8.4,
            vote_count: 27_000,
            popularity: 61.4,
            poster_path: Some("/poster.jpg".to_string()),
        }
    }

    #[test]
    fn test_search_result_movie_uses_movie_fields() {
        let item = CatalogItem::from(search_result(Some("movie")));

        assert!(!item.is_show);
        assert_eq!(item.title, "Fight Club");
        assert_eq!(item.release_date.as_deref(), Some("1999-10-15"));
        assert!(item.genres.is_none());
        assert!(item.trailer_url.is_none());
        assert!(item.streaming_info.is_none());
    }

    #[test]
    fn test_search_result_tv_uses_show_fields() {
        let item = CatalogItem::from(search_result(Some("tv")));

        assert!(item.is_show);
        assert_eq!(item.title, "Fight Club the Series");
        assert_eq!(item.release_date.as_deref(), Some("2020-01-01"));
    }

    #[test]
    fn test_search_result_without_discriminator_is_movie() {
        let item = CatalogItem::from(search_result(None));
        assert!(!item.is_show);
        assert_eq!(item.title, "Fight Club");
    }

    #[test]
    fn test_listing_with_show_hint_resolves_show_title() {
        let item = CatalogItem::from_listing(search_result(None), true);
        assert!(item.is_show);
        assert_eq!(item.title, "Fight Club the Series");
    }

    #[test]
    fn test_missing_title_maps_to_empty_string() {
        let mut result = search_result(Some("tv"));
        result.name = None;

        let item = CatalogItem::from(result);
        assert!(item.title.is_empty());
    }

    fn details_payload() -> TmdbDetails {
        serde_json::from_value(serde_json::json!({
            "id": 550,
            "title": "Fight Club",
            "overview": "An insomniac office worker",
            "release_date": "1999-10-15",
            "runtime": 139,
            "genres": [{"id": 18, "name": "Drama"}, {"id": 53, "name": "Thriller"}],
            "vote_average": 8.4,
            "vote_count": 27000,
            "popularity": 61.4,
            "poster_path": "/poster.jpg",
            "videos": {
                "results": [
                    {"key": "abc", "site": "Vimeo", "type": "Trailer"},
                    {"key": "def", "site": "YouTube", "type": "Clip"},
                    {"key": "SUXWAEX2jlg", "site": "YouTube", "type": "Trailer"}
                ]
            },
            "watch/providers": {
                "results": {
                    "US": {"flatrate": [{"provider_name": "Hulu", "logo_path": "/hulu.jpg"}]},
                    "BR": {"link": "https://example.com"},
                    "DE": {"flatrate": [
                        {"provider_name": "Netflix", "logo_path": "/netflix.jpg"},
                        {"provider_name": "WOW"}
                    ]}
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_details_maps_genres_trailer_and_streaming() {
        let item = CatalogItem::from_details(details_payload(), false);

        assert_eq!(item.id, 550);
        assert!(!item.is_show);
        assert_eq!(item.title, "Fight Club");
        assert_eq!(item.runtime, Some(139));
        assert_eq!(
            item.genres,
            Some(vec!["Drama".to_string(), "Thriller".to_string()])
        );
        // First YouTube video of type Trailer, not the Vimeo trailer or the clip
        assert_eq!(
            item.trailer_url.as_deref(),
            Some("https://www.youtube.com/watch?v=SUXWAEX2jlg")
        );

        let streaming = item.streaming_info.unwrap();
        // BR has no flatrate entries and contributes nothing
        assert_eq!(streaming.len(), 3);
        assert_eq!(streaming[0].country, "DE");
        assert_eq!(streaming[0].provider_name, "Netflix");
        assert_eq!(
            streaming[0].logo_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w92/netflix.jpg")
        );
        assert_eq!(streaming[1].provider_name, "WOW");
        assert!(streaming[1].logo_url.is_none());
        assert_eq!(streaming[2].country, "US");
        assert_eq!(streaming[2].provider_name, "Hulu");
    }

    #[test]
    fn test_details_without_trailer_or_providers() {
        let details: TmdbDetails = serde_json::from_value(serde_json::json!({
            "id": 1399,
            "name": "Game of Thrones",
            "first_air_date": "2011-04-17",
            "genres": []
        }))
        .unwrap();

        let item = CatalogItem::from_details(details, true);
        assert!(item.is_show);
        assert_eq!(item.title, "Game of Thrones");
        assert_eq!(item.release_date.as_deref(), Some("2011-04-17"));
        assert!(item.runtime.is_none());
        assert!(item.trailer_url.is_none());
        assert!(item.streaming_info.is_none());
        assert_eq!(item.genres, Some(vec![]));
    }

    #[test]
    fn test_details_show_fields_win_over_movie_fields() {
        let details: TmdbDetails = serde_json::from_value(serde_json::json!({
            "id": 42,
            "title": "Movie Title",
            "name": "Show Name",
            "release_date": "2001-01-01",
            "first_air_date": "2002-02-02"
        }))
        .unwrap();

        let item = CatalogItem::from_details(details, false);
        assert_eq!(item.title, "Show Name");
        assert_eq!(item.release_date.as_deref(), Some("2002-02-02"));
    }

    #[test]
    fn test_details_mapping_is_idempotent() {
        let first = CatalogItem::from_details(details_payload(), false);
        let second = CatalogItem::from_details(details_payload(), false);
        assert_eq!(first, second);
    }

    #[test]
    fn test_search_response_tolerates_missing_fields() {
        let response: TmdbSearchResponse =
            serde_json::from_str(r#"{"results": [{"id": 7}]}"#).unwrap();

        assert_eq!(response.page, 0);
        assert_eq!(response.results.len(), 1);
        let result = &response.results[0];
        assert_eq!(result.id, 7);
        assert!(result.title.is_none());
        assert!(result.genre_ids.is_empty());
    }
}
