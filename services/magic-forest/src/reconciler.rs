//! Checkout session reconciliation
//!
//! Turns a completed provider checkout session into a ledger donation.
//! There is no dedup: reconciling the same session twice records two
//! donations.

use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::gateway::{PaymentGateway, SessionState};
use crate::ledger::DonationLedger;
use crate::observability::{metrics, MetricsCollector};
use crate::types::{Donation, DonationType, ForestError, NewDonation, Plan, Result};

/// Outcome of a reconciliation: the session's own status plus the new donation
#[derive(Debug, Clone)]
pub struct ReconciledSession {
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub donation: Donation,
}

pub struct SessionReconciler {
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<DonationLedger>,
    metrics: MetricsCollector,
}

impl SessionReconciler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        ledger: Arc<DonationLedger>,
        metrics: MetricsCollector,
    ) -> Self {
        Self {
            gateway,
            ledger,
            metrics,
        }
    }

    pub async fn reconcile(&self, session_id: &str) -> Result<ReconciledSession> {
        let session = match self.gateway.retrieve_session(session_id).await {
            Ok(session) => session,
            Err(e) => {
                self.metrics.increment(metrics::PROVIDER_ERRORS, 1).await;
                warn!(
                    provider = self.gateway.name(),
                    session_id = %session_id,
                    error = %e,
                    "session_retrieval_failed"
                );
                return Err(e.into());
            }
        };

        let mut input = donation_from_metadata(&session)?;
        input.session_id = Some(session_id.to_string());

        let donation = self.ledger.create(input).await?;
        self.metrics.increment(metrics::SESSIONS_RECONCILED, 1).await;

        info!(
            session_id = %session_id,
            donation_id = %donation.id,
            payment_status = session.payment_status.as_deref().unwrap_or("-"),
            "session_reconciled"
        );

        Ok(ReconciledSession {
            status: session.status,
            payment_status: session.payment_status,
            donation,
        })
    }
}

/// Read donation fields from session metadata, defaulting to a one-time
/// donation of zero
fn donation_from_metadata(session: &SessionState) -> Result<NewDonation> {
    let metadata = &session.metadata;

    let donation_type = match metadata.get("donation_type") {
        Some(value) => DonationType::from_str(value)?,
        None => DonationType::OneTime,
    };

    let amount = match metadata.get("amount") {
        Some(value) => parse_amount(value)?,
        None => Decimal::ZERO,
    };

    let plan = metadata
        .get("plan")
        .filter(|value| !value.is_empty())
        .map(|value| Plan::from_str(value))
        .transpose()?;

    let mut input = NewDonation::new(donation_type, amount);
    input.plan = plan;
    input.email = session.customer_email.clone();
    input.payment_status = session.payment_status.clone();
    Ok(input)
}

fn parse_amount(value: &str) -> Result<Decimal> {
    let amount = Decimal::from_str(value.trim())
        .map_err(|_| ForestError::InvalidInput(format!("Invalid session amount: {}", value)))?;

    if amount < Decimal::ZERO {
        return Err(ForestError::InvalidInput(format!(
            "Invalid session amount: {}",
            value
        )));
    }
    Ok(amount)
}
