//! Simulated provider responses for test mode
//!
//! Used only when the real provider call failed and the service runs in
//! test mode. Nothing here is charged.

use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::checkout::{IntentResponse, SessionResponse};
use crate::ledger::DonationLedger;
use crate::types::{DonationType, NewDonation, Plan, Result};

pub const SIMULATED_INTENT_NOTE: &str =
    "Simulated payment for testing purposes. The payment provider could not be reached, so no real charge will occur.";

pub const SIMULATED_SESSION_NOTE: &str =
    "Simulated checkout for testing purposes. The donation was recorded without a real charge.";

/// What the donor asked for when the checkout attempt failed
#[derive(Debug, Clone)]
pub struct SimulatedCheckout {
    pub donation_type: DonationType,
    pub amount: Decimal,
    pub plan: Option<Plan>,
    pub email: Option<String>,
}

pub struct FallbackSimulator {
    ledger: Arc<DonationLedger>,
    frontend_url: String,
    publishable_key: Option<String>,
}

impl FallbackSimulator {
    pub fn new(
        ledger: Arc<DonationLedger>,
        frontend_url: &str,
        publishable_key: Option<String>,
    ) -> Self {
        Self {
            ledger,
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
            publishable_key,
        }
    }

    /// Placeholder intent with a client secret shaped like the provider's
    pub fn simulate_intent(&self) -> IntentResponse {
        IntentResponse {
            client_secret: format!("pi_{}_secret_{}", fake_token(), fake_token()),
            publishable_key: self.publishable_key.clone(),
            is_test_mode: true,
            test_note: Some(SIMULATED_INTENT_NOTE.to_string()),
        }
    }

    /// Record the requested donation as paid and point the donor at the
    /// confirmation page
    pub async fn simulate_session(&self, request: SimulatedCheckout) -> Result<SessionResponse> {
        let session_id = format!("demo_{}", Uuid::new_v4().simple());

        let mut input = NewDonation::new(request.donation_type, request.amount);
        input.plan = request.plan;
        input.email = request.email;
        input.payment_status = Some("succeeded".to_string());
        input.session_id = Some(session_id.clone());

        let donation = self.ledger.create(input).await?;

        Ok(SessionResponse {
            url: format!(
                "{}/confirmation?donation_id={}&demo=true",
                self.frontend_url, donation.id
            ),
            session_id,
            test_mode: true,
            test_note: Some(SIMULATED_SESSION_NOTE.to_string()),
            donation_id: Some(donation.id),
        })
    }
}

/// 24 lowercase hex characters
fn fake_token() -> String {
    let mut token = Uuid::new_v4().simple().to_string();
    token.truncate(24);
    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::MetricsCollector;
    use crate::store::InMemoryStore;

    fn simulator() -> (FallbackSimulator, Arc<DonationLedger>) {
        let ledger = Arc::new(DonationLedger::new(
            Arc::new(InMemoryStore::new()),
            MetricsCollector::new(),
        ));
        let simulator = FallbackSimulator::new(
            ledger.clone(),
            "http://localhost:3000/",
            Some("pk_test_forest".to_string()),
        );
        (simulator, ledger)
    }

    fn is_fake_token(s: &str) -> bool {
        s.len() == 24 && s.chars().all(|c| c.is_ascii_hexdigit())
    }

    #[test]
    fn test_simulated_client_secret_format() {
        let (simulator, _) = simulator();
        let response = simulator.simulate_intent();

        let rest = response.client_secret.strip_prefix("pi_").unwrap();
        let (id, secret) = rest.split_once("_secret_").unwrap();
        assert!(is_fake_token(id), "bad id: {}", id);
        assert!(is_fake_token(secret), "bad secret: {}", secret);

        assert!(response.is_test_mode);
        assert_eq!(response.publishable_key.as_deref(), Some("pk_test_forest"));
        assert!(response.test_note.is_some());
    }

    #[tokio::test]
    async fn test_simulated_session_records_donation() {
        let (simulator, ledger) = simulator();

        let response = simulator
            .simulate_session(SimulatedCheckout {
                donation_type: DonationType::Recurring,
                amount: Decimal::from(30),
                plan: Some(Plan::Ranger),
                email: Some("donor@example.com".to_string()),
            })
            .await
            .unwrap();

        let donation_id = response.donation_id.clone().unwrap();
        assert_eq!(
            response.url,
            format!("http://localhost:3000/confirmation?donation_id={}&demo=true", donation_id)
        );
        assert!(response.test_mode);
        assert!(response.session_id.starts_with("demo_"));

        let donation = ledger.get(&donation_id).await.unwrap();
        assert_eq!(donation.donation_type, DonationType::Recurring);
        assert_eq!(donation.amount, Decimal::from(30));
        assert_eq!(donation.plan, Some(Plan::Ranger));
        assert_eq!(donation.email.as_deref(), Some("donor@example.com"));
        assert_eq!(donation.payment_status.as_deref(), Some("succeeded"));
        assert_eq!(donation.session_id.as_deref(), Some(response.session_id.as_str()));
    }
}
