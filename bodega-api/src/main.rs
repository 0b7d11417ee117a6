use std::net::SocketAddr;
use std::sync::Arc;

use bodega_api::{app, AppState};
use bodega_order::workflow::OrderWorkflow;
use bodega_store::{DbClient, PgCatalogStore, PgOrderStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bodega_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = bodega_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Bodega API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let catalog = Arc::new(PgCatalogStore::new(db.pool.clone()));
    let orders = Arc::new(PgOrderStore::new(db.pool.clone()));
    let workflow = Arc::new(OrderWorkflow::new(catalog.clone(), orders));

    let app_state = AppState { catalog, workflow };
    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
