//! Payment provider adapter
//!
//! The service talks to its payment provider through [`PaymentGateway`].
//! Every provider-side failure (network, credentials, rejected request,
//! unreadable response) surfaces as a single [`ProviderError`]; callers
//! decide what to do with it.

pub mod stripe;

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};

pub use stripe::StripeGateway;

/// Failure reported by the payment provider, carrying its message verbatim
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ProviderError {
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Checkout flavour requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutMode {
    Payment,
    Subscription,
}

impl CheckoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutMode::Payment => "payment",
            CheckoutMode::Subscription => "subscription",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntentRequest {
    /// Amount in minor units (cents)
    pub amount_minor: i64,
    pub currency: String,
    pub description: String,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub name: String,
    pub description: String,
    /// Unit price in minor units (cents)
    pub unit_amount_minor: i64,
    pub currency: String,
    /// Billing interval for subscriptions, e.g. "month"
    pub recurring_interval: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub mode: CheckoutMode,
    pub line_item: LineItem,
    pub customer_email: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Provider-side view of a checkout session
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub id: String,
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub metadata: HashMap<String, String>,
    pub customer_email: Option<String>,
}

/// Remote payment capability
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent for an embedded card or wallet form
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, ProviderError>;

    /// Create a hosted checkout session (one-time or subscription)
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, ProviderError>;

    /// Look up a checkout session after the donor returns from the provider
    async fn retrieve_session(&self, session_id: &str) -> Result<SessionState, ProviderError>;

    /// Provider name
    fn name(&self) -> &str;
}

