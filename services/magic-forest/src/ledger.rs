//! Donation ledger
//!
//! Owns creation and lookup of donation records. Records are stored as
//! given: the ledger only assigns the id and timestamp, and never
//! deduplicates (two creates with the same `session_id` give two records).

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::observability::{metrics, MetricsCollector};
use crate::store::LedgerStore;
use crate::types::{Donation, ForestError, NewDonation, Result};

pub struct DonationLedger {
    store: Arc<dyn LedgerStore>,
    metrics: MetricsCollector,
}

impl DonationLedger {
    pub fn new(store: Arc<dyn LedgerStore>, metrics: MetricsCollector) -> Self {
        Self { store, metrics }
    }

    /// Persist a new donation with a fresh id and creation timestamp
    pub async fn create(&self, input: NewDonation) -> Result<Donation> {
        let donation = Donation::from_new(Uuid::new_v4().to_string(), input, Utc::now());

        self.store.insert_donation(&donation).await?;
        self.metrics.increment(metrics::DONATIONS_CREATED, 1).await;

        info!(
            donation_id = %donation.id,
            donation_type = %donation.donation_type,
            amount = %donation.amount,
            session_id = donation.session_id.as_deref().unwrap_or("-"),
            "donation_created"
        );

        Ok(donation)
    }

    pub async fn get(&self, id: &str) -> Result<Donation> {
        self.store
            .find_donation(id)
            .await?
            .ok_or_else(|| ForestError::NotFound("Donation not found".to_string()))
    }

    /// Sum of all donation amounts
    pub async fn total_amount(&self) -> Result<Decimal> {
        self.store.sum_amounts().await
    }
}
