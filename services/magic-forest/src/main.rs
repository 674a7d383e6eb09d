use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};

use magic_forest::observability::metrics;
use magic_forest::{
    app, AppState, InMemoryStore, LedgerStore, PgStore, Settings, StripeGateway, TreeStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Starting Magic Forest donation service...");

    let settings = Settings::load()?;

    let (ledger_store, tree_store): (Arc<dyn LedgerStore>, Arc<dyn TreeStore>) =
        match settings.database_url.as_deref().filter(|url| !url.is_empty()) {
            Some(url) => {
                info!("Connecting to database...");
                let store = Arc::new(PgStore::connect(url).await?);
                info!("✓ Database connected");
                (store.clone() as Arc<dyn LedgerStore>, store as Arc<dyn TreeStore>)
            }
            None => {
                warn!("DATABASE_URL not set, donations and trees are kept in memory only");
                let store = Arc::new(InMemoryStore::new());
                (store.clone() as Arc<dyn LedgerStore>, store as Arc<dyn TreeStore>)
            }
        };

    let gateway = StripeGateway::new(
        settings.stripe_secret_key.clone(),
        &settings.stripe_api_base,
        Duration::from_secs(settings.provider_timeout_secs),
    )?;
    if !gateway.has_credentials() {
        warn!("STRIPE_SECRET_KEY not set, every provider call will fail");
    }

    let test_mode = settings.is_test_mode();
    info!(
        test_mode = test_mode,
        tree_threshold = %settings.tree_threshold,
        "Payment mode configured"
    );

    let state = Arc::new(AppState::build(
        &settings,
        ledger_store,
        tree_store,
        Arc::new(gateway),
        Box::new(StdRng::from_entropy()),
    ));
    state
        .metrics
        .gauge(metrics::TEST_MODE, if test_mode { 1.0 } else { 0.0 })
        .await;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", settings.port)).await?;
    info!("🌲 Magic Forest listening on port {}", settings.port);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
