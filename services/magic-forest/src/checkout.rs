//! Payment intent and checkout session creation
//!
//! Each operation makes exactly one provider call. When that call fails
//! the error goes back to the client, unless the service runs in test mode,
//! in which case [`FallbackSimulator`] answers instead.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::amount::to_minor_units;
use crate::config::Settings;
use crate::fallback::{FallbackSimulator, SimulatedCheckout};
use crate::gateway::{
    CheckoutMode, CheckoutRequest, IntentRequest, LineItem, PaymentGateway, ProviderError,
};
use crate::ledger::DonationLedger;
use crate::observability::{metrics, MetricsCollector};
use crate::types::{DonationType, Plan, Result};

pub const TEST_MODE_NOTE: &str = "Test mode is active. In test mode, use the test card number 4242 4242 4242 4242, any future expiration date, any 3-digit CVC, and any 5-digit ZIP code.";

const CURRENCY: &str = "usd";
const APPLICATION: &str = "magic_forest";

/// Response for an embedded payment form
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentResponse {
    pub client_secret: String,
    pub publishable_key: Option<String>,
    pub is_test_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_note: Option<String>,
}

/// Response for a hosted checkout redirect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub url: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub test_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_note: Option<String>,
    /// Set only for simulated sessions, which record their donation up front
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donation_id: Option<String>,
}

pub struct CheckoutService {
    gateway: Arc<dyn PaymentGateway>,
    fallback: FallbackSimulator,
    test_mode: bool,
    publishable_key: Option<String>,
    frontend_url: String,
    metrics: MetricsCollector,
}

impl CheckoutService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        ledger: Arc<DonationLedger>,
        settings: &Settings,
        metrics: MetricsCollector,
    ) -> Self {
        let publishable_key = settings
            .stripe_publishable_key
            .clone()
            .filter(|k| !k.is_empty());

        Self {
            gateway,
            fallback: FallbackSimulator::new(
                ledger,
                settings.frontend_url(),
                publishable_key.clone(),
            ),
            test_mode: settings.is_test_mode(),
            publishable_key,
            frontend_url: settings.frontend_url().to_string(),
            metrics,
        }
    }

    fn test_note(&self) -> Option<String> {
        self.test_mode.then(|| TEST_MODE_NOTE.to_string())
    }

    fn success_url(&self) -> String {
        format!(
            "{}/confirmation?session_id={{CHECKOUT_SESSION_ID}}",
            self.frontend_url
        )
    }

    fn cancel_url(&self) -> String {
        format!("{}/donate", self.frontend_url)
    }

    /// Record a provider failure and decide whether the fallback may answer
    async fn recover(&self, operation: &str, error: ProviderError) -> Result<()> {
        self.metrics.increment(metrics::PROVIDER_ERRORS, 1).await;
        warn!(
            provider = self.gateway.name(),
            operation = operation,
            error = %error,
            "provider_call_failed"
        );

        if !self.test_mode {
            return Err(error.into());
        }

        self.metrics.increment(metrics::FALLBACKS_ENGAGED, 1).await;
        warn!(operation = operation, "fallback_engaged");
        Ok(())
    }

    pub async fn create_payment_intent(
        &self,
        amount: Decimal,
        email: Option<String>,
    ) -> Result<IntentResponse> {
        let request = IntentRequest {
            amount_minor: to_minor_units(amount)?,
            currency: CURRENCY.to_string(),
            description: "Magic Forest Donation".to_string(),
            metadata: metadata([
                ("donation_type", DonationType::OneTime.as_str().to_string()),
                ("amount", amount.normalize().to_string()),
                ("customer_email", email.clone().unwrap_or_default()),
            ]),
        };

        match self.gateway.create_intent(request).await {
            Ok(intent) => {
                info!(intent_id = %intent.id, amount = %amount, "payment_intent_created");
                Ok(IntentResponse {
                    client_secret: intent.client_secret,
                    publishable_key: self.publishable_key.clone(),
                    is_test_mode: self.test_mode,
                    test_note: self.test_note(),
                })
            }
            Err(e) => {
                self.recover("create_payment_intent", e).await?;
                Ok(self.fallback.simulate_intent())
            }
        }
    }

    /// Hosted checkout for a one-time donation
    pub async fn create_checkout_session(
        &self,
        amount: Decimal,
        email: Option<String>,
    ) -> Result<SessionResponse> {
        let request = CheckoutRequest {
            mode: CheckoutMode::Payment,
            line_item: LineItem {
                name: "Magic Forest Donation".to_string(),
                description: "One-time donation to support The Magic Forest".to_string(),
                unit_amount_minor: to_minor_units(amount)?,
                currency: CURRENCY.to_string(),
                recurring_interval: None,
            },
            customer_email: email.clone(),
            success_url: self.success_url(),
            cancel_url: self.cancel_url(),
            metadata: metadata([
                ("donation_type", DonationType::OneTime.as_str().to_string()),
                ("amount", amount.normalize().to_string()),
            ]),
        };

        self.open_session(
            "create_checkout_session",
            request,
            SimulatedCheckout {
                donation_type: DonationType::OneTime,
                amount,
                plan: None,
                email,
            },
        )
        .await
    }

    /// Hosted checkout for a monthly plan. Unknown plans are rejected
    /// before the provider is contacted.
    pub async fn create_subscription(
        &self,
        plan: &str,
        email: Option<String>,
    ) -> Result<SessionResponse> {
        let plan = Plan::from_str(plan)?;
        let amount = plan.monthly_amount();

        let request = CheckoutRequest {
            mode: CheckoutMode::Subscription,
            line_item: LineItem {
                name: format!("Magic Forest {} Plan", plan.display_name()),
                description: format!(
                    "Monthly donation to Magic Forest - {} tier",
                    plan.display_name()
                ),
                unit_amount_minor: to_minor_units(amount)?,
                currency: CURRENCY.to_string(),
                recurring_interval: Some("month".to_string()),
            },
            customer_email: email.clone(),
            success_url: self.success_url(),
            cancel_url: self.cancel_url(),
            metadata: metadata([
                ("donation_type", DonationType::Recurring.as_str().to_string()),
                ("plan", plan.as_str().to_string()),
                ("amount", amount.normalize().to_string()),
            ]),
        };

        self.open_session(
            "create_subscription",
            request,
            SimulatedCheckout {
                donation_type: DonationType::Recurring,
                amount,
                plan: Some(plan),
                email,
            },
        )
        .await
    }

    async fn open_session(
        &self,
        operation: &str,
        request: CheckoutRequest,
        simulated: SimulatedCheckout,
    ) -> Result<SessionResponse> {
        let mode = request.mode;

        match self.gateway.create_checkout_session(request).await {
            Ok(session) => {
                info!(
                    session_id = %session.id,
                    mode = mode.as_str(),
                    "checkout_session_created"
                );
                Ok(SessionResponse {
                    url: session.url,
                    session_id: session.id,
                    test_mode: self.test_mode,
                    test_note: self.test_note(),
                    donation_id: None,
                })
            }
            Err(e) => {
                self.recover(operation, e).await?;
                self.fallback.simulate_session(simulated).await
            }
        }
    }
}

fn metadata<const N: usize>(entries: [(&str, String); N]) -> BTreeMap<String, String> {
    let mut map: BTreeMap<String, String> = entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    map.insert("application".to_string(), APPLICATION.to_string());
    map
}

