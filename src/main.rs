use std::sync::Arc;

use cinematch_api::{
    api::{create_router, AppState},
    config::Config,
    db,
    services::TmdbClient,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;
    sqlx::migrate!().run(&pool).await?;

    let store = Arc::new(db::PostgresUserStore::new(pool));
    let catalog = Arc::new(TmdbClient::new(
        config.tmdb_api_url.clone(),
        config.tmdb_api_key.clone(),
    ));

    let state = AppState::new(store, catalog);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
