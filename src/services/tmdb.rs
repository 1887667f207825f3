//! TMDB catalog client
//!
//! Wraps the external catalog endpoints used by the API: multi-type
//! search, genre-filtered discovery, per-item details (with embedded
//! videos and watch providers), the per-type genre lists, and similar
//! items. The API key is injected as a query parameter on every call;
//! failures surface as typed errors and are never retried.

use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

use crate::{
    error::{AppError, AppResult},
    models::{
        merge_genres,
        tmdb::{TmdbDetails, TmdbGenreResponse, TmdbSearchResponse},
        CatalogItem, Genre, Paginated, SearchRequest,
    },
    services::CatalogProvider,
};

#[derive(Clone)]
pub struct TmdbClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl TmdbClient {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
        }
    }

    /// Picks the endpoint for a search request: free-text queries go to
    /// multi-search, everything else is a discovery run.
    fn search_endpoint(request: &SearchRequest) -> &'static str {
        if request.query.is_some() {
            "search/multi"
        } else {
            "discover/movie"
        }
    }

    fn detail_endpoint(id: i64, is_show: bool) -> String {
        if is_show {
            format!("tv/{}", id)
        } else {
            format!("movie/{}", id)
        }
    }

    fn similar_endpoint(id: i64, is_show: bool) -> String {
        if is_show {
            format!("tv/{}/similar", id)
        } else {
            format!("movie/{}/similar", id)
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> AppResult<T> {
        let url = format!("{}/{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(path, %status, body = %body, "TMDB request failed");
            return Err(AppError::ExternalApi(format!(
                "TMDB returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }

    async fn genre_list(&self, kind: &str) -> AppResult<Vec<Genre>> {
        let response: TmdbGenreResponse = self
            .get_json(&format!("genre/{}/list", kind), &[])
            .await?;
        Ok(response.genres)
    }
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbClient {
    async fn search(&self, request: SearchRequest) -> AppResult<Paginated<CatalogItem>> {
        let endpoint = Self::search_endpoint(&request);

        let mut params: Vec<(&str, String)> = vec![("page", request.page.to_string())];
        if let Some(query) = &request.query {
            params.push(("query", query.clone()));
        } else {
            if let Some(year) = request.year {
                params.push(("year", year.to_string()));
            }
            if let Some(language) = &request.language {
                params.push(("language", language.clone()));
            }
            if let Some(genre_id) = request.genre_id {
                params.push(("with_genres", genre_id.to_string()));
            }
        }

        let response: TmdbSearchResponse = self.get_json(endpoint, &params).await?;

        // Items without a resolvable title are useless downstream
        let results: Vec<CatalogItem> = response
            .results
            .into_iter()
            .map(CatalogItem::from)
            .filter(|item| !item.title.is_empty())
            .collect();

        tracing::info!(endpoint, results = results.len(), "Catalog search completed");

        Ok(Paginated {
            page: response.page,
            total_pages: response.total_pages,
            total_results: response.total_results,
            results,
        })
    }

    async fn details(&self, id: i64, is_show: bool) -> AppResult<CatalogItem> {
        let endpoint = Self::detail_endpoint(id, is_show);
        let params = [(
            "append_to_response",
            "videos,watch/providers".to_string(),
        )];

        let details: TmdbDetails = self.get_json(&endpoint, &params).await?;

        Ok(CatalogItem::from_details(details, is_show))
    }

    async fn genres(&self) -> AppResult<Vec<Genre>> {
        let (movie_genres, tv_genres) =
            tokio::try_join!(self.genre_list("movie"), self.genre_list("tv"))?;

        Ok(merge_genres(movie_genres, tv_genres))
    }

    async fn similar(&self, id: i64, is_show: bool) -> AppResult<Vec<CatalogItem>> {
        let endpoint = Self::similar_endpoint(id, is_show);
        let response: TmdbSearchResponse = self.get_json(&endpoint, &[]).await?;

        // Similar-item payloads carry no media_type; the endpoint hit
        // already tells us whether these are shows
        let items: Vec<CatalogItem> = response
            .results
            .into_iter()
            .map(|result| CatalogItem::from_listing(result, is_show))
            .filter(|item| !item.title.is_empty())
            .collect();

        tracing::info!(endpoint, results = items.len(), "Similar items fetched");

        Ok(items)
    }
}
