//! Recommendation engine
//!
//! Combines two strategies into one bounded, deduplicated list per
//! user: a discovery search filtered to a randomly picked preferred
//! genre, and the details of items other users rated well. The random
//! pick goes through a seedable RNG so the branch is testable; per-item
//! detail failures in the social-proof path are skipped, not escalated.

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{collections::HashSet, sync::Arc};
use tokio::sync::Mutex;

use crate::{
    db::UserStore,
    error::{AppError, AppResult},
    models::{CatalogItem, SearchRequest},
    services::CatalogProvider,
};

/// Upper bound on each strategy's contribution
const PICKS_PER_STRATEGY: usize = 5;

/// Minimum cross-user average score for the social-proof strategy
const MIN_PEER_AVERAGE: f64 = 7.0;

pub struct RecommendationEngine {
    store: Arc<dyn UserStore>,
    catalog: Arc<dyn CatalogProvider>,
    rng: Mutex<StdRng>,
}

impl RecommendationEngine {
    pub fn new(store: Arc<dyn UserStore>, catalog: Arc<dyn CatalogProvider>) -> Self {
        Self::with_rng(store, catalog, StdRng::from_entropy())
    }

    /// Constructs the engine with a caller-supplied RNG, making the
    /// genre-pick branch deterministic under test.
    pub fn with_rng(
        store: Arc<dyn UserStore>,
        catalog: Arc<dyn CatalogProvider>,
        rng: StdRng,
    ) -> Self {
        Self {
            store,
            catalog,
            rng: Mutex::new(rng),
        }
    }

    /// Builds the recommendation list for one user: preference picks
    /// first, then peer picks, deduplicated by item id with the first
    /// occurrence winning. An empty list is a valid outcome.
    pub async fn recommendations_for(&self, user_id: i32) -> AppResult<Vec<CatalogItem>> {
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        // The strategies share no mutable state and run concurrently
        let (preference_picks, peer_picks) =
            tokio::join!(self.preference_picks(user.id), self.peer_picks(user.id));

        let mut seen = HashSet::new();
        let recommendations: Vec<CatalogItem> = preference_picks?
            .into_iter()
            .chain(peer_picks?)
            .filter(|item| seen.insert(item.id))
            .collect();

        tracing::info!(
            user_id,
            recommendations = recommendations.len(),
            "Recommendations assembled"
        );

        Ok(recommendations)
    }

    /// Strategy 1: discovery search filtered to one of the user's
    /// preferred genres, picked uniformly at random. External failures
    /// here propagate to the caller.
    async fn preference_picks(&self, user_id: i32) -> AppResult<Vec<CatalogItem>> {
        let genre_ids = self.store.preferred_genres(user_id).await?;
        if genre_ids.is_empty() {
            return Ok(Vec::new());
        }

        let genre_id = {
            let mut rng = self.rng.lock().await;
            genre_ids[rng.gen_range(0..genre_ids.len())]
        };

        tracing::debug!(user_id, genre_id, "Picked preference genre");

        let page = self
            .catalog
            .search(SearchRequest {
                genre_id: Some(genre_id),
                ..SearchRequest::default()
            })
            .await?;

        Ok(page
            .results
            .into_iter()
            .take(PICKS_PER_STRATEGY)
            .collect())
    }

    /// Strategy 2: full details for the items other users rated well.
    /// Each fetch runs in its own task; a failing item is logged and
    /// skipped so one catalog hiccup never blanks the whole list.
    async fn peer_picks(&self, user_id: i32) -> AppResult<Vec<CatalogItem>> {
        let top_rated = self
            .store
            .top_rated_excluding(user_id, MIN_PEER_AVERAGE, PICKS_PER_STRATEGY as i64)
            .await?;

        let mut tasks = Vec::new();
        for entry in top_rated {
            let catalog = Arc::clone(&self.catalog);
            tasks.push(tokio::spawn(async move {
                let details = catalog.details(entry.item_id, entry.is_show).await;
                (entry.item_id, details)
            }));
        }

        // Await in spawn order to keep recombination deterministic
        let mut items = Vec::new();
        let mut skipped = Vec::new();
        for task in tasks {
            match task.await {
                Ok((_, Ok(item))) => items.push(item),
                Ok((item_id, Err(e))) => {
                    tracing::warn!(item_id, error = %e, "Skipping top rated item, detail fetch failed");
                    skipped.push(item_id);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Detail fetch task failed");
                }
            }
        }

        if !skipped.is_empty() {
            tracing::warn!(
                fetched = items.len(),
                skipped = skipped.len(),
                "Partial detail fetch failure in peer picks"
            );
        }

        Ok(items)
    }
}
