//! Stripe REST client (form-encoded v1 API)

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use super::{
    CheckoutRequest, CheckoutSession, IntentRequest, PaymentGateway, PaymentIntent, ProviderError,
    SessionState,
};

/// Stripe API client
pub struct StripeGateway {
    client: Client,
    base_url: String,
    secret_key: Option<String>,
}

impl StripeGateway {
    /// Build a client against `base_url` (normally `https://api.stripe.com`)
    ///
    /// A missing secret key is not an error here: every call will fail
    /// with a [`ProviderError`] instead, which the checkout fallback handles.
    pub fn new(
        secret_key: Option<String>,
        base_url: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.filter(|k| !k.is_empty()),
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.secret_key.is_some()
    }

    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, ProviderError> {
        match &self.secret_key {
            Some(key) => Ok(builder.bearer_auth(key)),
            None => Err(ProviderError::new(
                "No API key provided. Set STRIPE_SECRET_KEY to reach Stripe.",
            )),
        }
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let request = self.authorized(self.client.post(&url))?.form(params);
        self.send(endpoint, request).await
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let request = self.authorized(self.client.get(&url))?;
        self.send(endpoint, request).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<T, ProviderError> {
        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::new(format!("Stripe request to {} failed: {}", endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::new(error_message(status, &body)));
        }

        debug!("Stripe {} -> {}", endpoint, status);

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::new(format!("Invalid Stripe response: {}", e)))
    }
}

/// Pull `error.message` out of a Stripe error envelope, else fall back to the raw body
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<StripeErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .unwrap_or_else(|| format!("Stripe API error ({}): {}", status, body))
}

/// Session ids go straight into the URL path
fn is_valid_session_id(session_id: &str) -> bool {
    !session_id.is_empty()
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn intent_params(request: &IntentRequest) -> Vec<(String, String)> {
    let mut params = vec![
        ("amount".to_string(), request.amount_minor.to_string()),
        ("currency".to_string(), request.currency.clone()),
        ("description".to_string(), request.description.clone()),
        (
            "automatic_payment_methods[enabled]".to_string(),
            "true".to_string(),
        ),
    ];
    for (key, value) in &request.metadata {
        params.push((format!("metadata[{}]", key), value.clone()));
    }
    params
}

fn checkout_params(request: &CheckoutRequest) -> Vec<(String, String)> {
    let item = &request.line_item;
    let mut params = vec![
        ("mode".to_string(), request.mode.as_str().to_string()),
        ("payment_method_types[0]".to_string(), "card".to_string()),
        (
            "line_items[0][price_data][currency]".to_string(),
            item.currency.clone(),
        ),
        (
            "line_items[0][price_data][product_data][name]".to_string(),
            item.name.clone(),
        ),
        (
            "line_items[0][price_data][product_data][description]".to_string(),
            item.description.clone(),
        ),
        (
            "line_items[0][price_data][unit_amount]".to_string(),
            item.unit_amount_minor.to_string(),
        ),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
    ];
    if let Some(interval) = &item.recurring_interval {
        params.push((
            "line_items[0][price_data][recurring][interval]".to_string(),
            interval.clone(),
        ));
    }
    if let Some(email) = &request.customer_email {
        params.push(("customer_email".to_string(), email.clone()));
    }
    for (key, value) in &request.metadata {
        params.push((format!("metadata[{}]", key), value.clone()));
    }
    params
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, ProviderError> {
        let intent: StripePaymentIntent = self
            .post_form("/v1/payment_intents", &intent_params(&request))
            .await?;

        let client_secret = intent
            .client_secret
            .ok_or_else(|| ProviderError::new("Payment intent response missing client_secret"))?;

        Ok(PaymentIntent {
            id: intent.id,
            client_secret,
        })
    }

    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, ProviderError> {
        let session: StripeCheckoutSession = self
            .post_form("/v1/checkout/sessions", &checkout_params(&request))
            .await?;

        let url = session
            .url
            .ok_or_else(|| ProviderError::new("Checkout session response missing url"))?;

        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<SessionState, ProviderError> {
        if !is_valid_session_id(session_id) {
            return Err(ProviderError::new(format!(
                "Invalid checkout session id: {}",
                session_id
            )));
        }

        let session: StripeCheckoutSession = self
            .get(&format!("/v1/checkout/sessions/{}", session_id))
            .await?;

        let customer_email = session
            .customer_details
            .and_then(|details| details.email)
            .or(session.customer_email);

        Ok(SessionState {
            id: session.id,
            status: session.status,
            payment_status: session.payment_status,
            metadata: session.metadata,
            customer_email,
        })
    }

    fn name(&self) -> &str {
        "stripe"
    }
}

// Stripe wire types

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripePaymentIntent {
    id: String,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeCheckoutSession {
    id: String,
    url: Option<String>,
    status: Option<String>,
    payment_status: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
    customer_details: Option<StripeCustomerDetails>,
    customer_email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeCustomerDetails {
    email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{CheckoutMode, LineItem};
    use std::collections::BTreeMap;

    #[test]
    fn test_error_message_prefers_envelope() {
        let body = r#"{"error":{"message":"Invalid API Key provided: sk_test_***","type":"invalid_request_error"}}"#;
        assert_eq!(
            error_message(reqwest::StatusCode::UNAUTHORIZED, body),
            "Invalid API Key provided: sk_test_***"
        );

        let raw = error_message(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert!(raw.contains("502"));
        assert!(raw.contains("upstream down"));
    }

    #[test]
    fn test_session_id_validation() {
        assert!(is_valid_session_id("cs_test_a1B2c3"));
        assert!(!is_valid_session_id(""));
        assert!(!is_valid_session_id("../payment_intents"));
        assert!(!is_valid_session_id("cs_test?expand=customer"));
    }

    #[test]
    fn test_subscription_params() {
        let mut metadata = BTreeMap::new();
        metadata.insert("plan".to_string(), "guardian".to_string());

        let params = checkout_params(&CheckoutRequest {
            mode: CheckoutMode::Subscription,
            line_item: LineItem {
                name: "Magic Forest Guardian Plan".to_string(),
                description: "Monthly donation".to_string(),
                unit_amount_minor: 1500,
                currency: "usd".to_string(),
                recurring_interval: Some("month".to_string()),
            },
            customer_email: None,
            success_url: "https://forest.test/confirmation".to_string(),
            cancel_url: "https://forest.test/donate".to_string(),
            metadata,
        });

        let lookup = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(lookup("mode"), Some("subscription"));
        assert_eq!(lookup("line_items[0][price_data][unit_amount]"), Some("1500"));
        assert_eq!(
            lookup("line_items[0][price_data][recurring][interval]"),
            Some("month")
        );
        assert_eq!(lookup("metadata[plan]"), Some("guardian"));
        assert_eq!(lookup("customer_email"), None);
    }

    #[tokio::test]
    async fn test_missing_key_is_provider_error() {
        let gateway = StripeGateway::new(None, "http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        assert!(!gateway.has_credentials());

        let err = gateway.retrieve_session("cs_test_123").await.unwrap_err();
        assert!(err.message.contains("No API key provided"));
    }
}
