pub mod amount;
pub mod checkout;
pub mod config;
pub mod fallback;
pub mod forest;
pub mod gateway;
pub mod handlers;
pub mod health;
pub mod ledger;
pub mod observability;
pub mod reconciler;
pub mod store;
pub mod types;

use axum::{
    routing::{get, post},
    Router,
};
use rand::RngCore;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use checkout::CheckoutService;
pub use config::Settings;
pub use forest::TreeGate;
pub use gateway::{PaymentGateway, ProviderError, StripeGateway};
pub use ledger::DonationLedger;
pub use observability::MetricsCollector;
pub use reconciler::SessionReconciler;
pub use store::{InMemoryStore, LedgerStore, PgStore, TreeStore};
pub use types::{Donation, DonationType, ForestError, NewDonation, NewTree, PaymentMethod, Plan, Tree};

/// Application state shared across handlers
pub struct AppState {
    pub ledger: Arc<DonationLedger>,
    pub trees: TreeGate,
    pub checkout: CheckoutService,
    pub reconciler: SessionReconciler,
    pub metrics: MetricsCollector,
}

impl AppState {
    /// Wire every component from one settings value and its collaborators
    pub fn build(
        settings: &Settings,
        ledger_store: Arc<dyn LedgerStore>,
        tree_store: Arc<dyn TreeStore>,
        gateway: Arc<dyn PaymentGateway>,
        rng: Box<dyn RngCore + Send>,
    ) -> Self {
        let metrics = MetricsCollector::new();
        let ledger = Arc::new(DonationLedger::new(ledger_store, metrics.clone()));

        Self {
            trees: TreeGate::new(
                ledger.clone(),
                tree_store,
                settings.tree_threshold,
                rng,
                metrics.clone(),
            ),
            checkout: CheckoutService::new(gateway.clone(), ledger.clone(), settings, metrics.clone()),
            reconciler: SessionReconciler::new(gateway, ledger.clone(), metrics.clone()),
            ledger,
            metrics,
        }
    }
}

/// Build the API router
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/donations", post(handlers::donations::create_donation))
        .route("/donations/{id}", get(handlers::donations::get_donation))
        .route("/total-donations", get(handlers::donations::total_donations))
        .route("/trees", get(handlers::trees::list_trees).post(handlers::trees::create_tree))
        .route("/create-payment-intent", post(handlers::payments::create_payment_intent))
        .route("/create-checkout-session", post(handlers::payments::create_checkout_session))
        .route("/create-subscription", post(handlers::payments::create_subscription))
        .route(
            "/checkout-session/{session_id}",
            get(handlers::payments::get_checkout_session),
        )
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
