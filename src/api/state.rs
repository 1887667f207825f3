use std::sync::Arc;

use crate::{db::UserStore, services::CatalogProvider, services::RecommendationEngine};

/// Shared application state
///
/// Holds the persistence store, the catalog client and the engine built
/// on top of them. Everything is behind an `Arc`, so cloning per
/// request is cheap and no request mutates shared state directly.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub catalog: Arc<dyn CatalogProvider>,
    pub engine: Arc<RecommendationEngine>,
}

impl AppState {
    pub fn new(store: Arc<dyn UserStore>, catalog: Arc<dyn CatalogProvider>) -> Self {
        let engine = Arc::new(RecommendationEngine::new(
            Arc::clone(&store),
            Arc::clone(&catalog),
        ));

        Self {
            store,
            catalog,
            engine,
        }
    }
}
