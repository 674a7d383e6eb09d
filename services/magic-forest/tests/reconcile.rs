//! SessionReconciler against a scripted gateway


use magic_forest::observability::metrics;
use magic_forest::{
    DonationLedger, DonationType, ForestError, InMemoryStore, MetricsCollector, Plan,
    SessionReconciler,
};
use mock_gateway::{paid_session, ScriptedGateway};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

fn reconciler(gateway: ScriptedGateway) -> (SessionReconciler, Arc<DonationLedger>, MetricsCollector) {
    let metrics = MetricsCollector::new();
    let ledger = Arc::new(DonationLedger::new(
        Arc::new(InMemoryStore::new()),
        metrics.clone(),
    ));
    (
        SessionReconciler::new(Arc::new(gateway), ledger.clone(), metrics.clone()),
        ledger,
        metrics,
    )
}

#[tokio::test]
async fn test_recurring_guardian_session() {
    let gateway = ScriptedGateway::new().with_session(paid_session(
        "cs_test_guardian",
        &[
            ("donation_type", "recurring"),
            ("plan", "guardian"),
            ("amount", "15"),
        ],
    ));
    let (reconciler, ledger, metrics) = reconciler(gateway);

    let result = assert_ok!(reconciler.reconcile("cs_test_guardian").await);

    assert_eq!(result.status.as_deref(), Some("complete"));
    assert_eq!(result.payment_status.as_deref(), Some("paid"));
    assert_eq!(result.donation.donation_type, DonationType::Recurring);
    assert_eq!(result.donation.plan, Some(Plan::Guardian));
    assert_eq!(result.donation.amount, Decimal::from(15));
    assert_eq!(result.donation.email.as_deref(), Some("donor@example.com"));
    assert_eq!(result.donation.session_id.as_deref(), Some("cs_test_guardian"));

    let stored = assert_ok!(ledger.get(&result.donation.id).await);
    assert_eq!(stored, result.donation);
    assert_eq!(metrics.get_counter(metrics::SESSIONS_RECONCILED).await, 1);
}

#[tokio::test]
async fn test_reconcile_twice_records_twice() {
    let gateway = ScriptedGateway::new().with_session(paid_session(
        "cs_test_twice",
        &[("donation_type", "one-time"), ("amount", "25")],
    ));
    let (reconciler, ledger, _) = reconciler(gateway);

    let first = assert_ok!(reconciler.reconcile("cs_test_twice").await);
    let second = assert_ok!(reconciler.reconcile("cs_test_twice").await);

    assert_ne!(first.donation.id, second.donation.id);
    assert_eq!(ledger.total_amount().await.unwrap(), Decimal::from(50));
}

#[tokio::test]
async fn test_provider_failure_creates_nothing() {
    let (reconciler, ledger, metrics) =
        reconciler(ScriptedGateway::unreachable("No such checkout.session"));

    let err = assert_err!(reconciler.reconcile("cs_test_missing").await);

    assert!(matches!(err, ForestError::Provider(ref e) if e.message == "No such checkout.session"));
    assert_eq!(ledger.total_amount().await.unwrap(), Decimal::ZERO);
    assert_eq!(metrics.get_counter(metrics::PROVIDER_ERRORS).await, 1);
}

#[tokio::test]
async fn test_bad_metadata_records_nothing() {
    let gateway = ScriptedGateway::new()
        .with_session(paid_session("cs_test_bad", &[("amount", "-5")]));
    let (reconciler, ledger, _) = reconciler(gateway);

    let err = assert_err!(reconciler.reconcile("cs_test_bad").await);

    assert!(matches!(err, ForestError::InvalidInput(_)));
    assert_eq!(ledger.total_amount().await.unwrap(), Decimal::ZERO);
}
