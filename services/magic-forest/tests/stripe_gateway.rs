//! StripeGateway against a local mock of the Stripe REST API

use magic_forest::gateway::{
    CheckoutMode, CheckoutRequest, IntentRequest, LineItem, PaymentGateway, StripeGateway,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "sk_test_forest";

fn gateway(server: &MockServer) -> StripeGateway {
    StripeGateway::new(Some(KEY.to_string()), &server.uri(), Duration::from_secs(5)).unwrap()
}

fn intent_request(amount_minor: i64) -> IntentRequest {
    let mut metadata = BTreeMap::new();
    metadata.insert("application".to_string(), "magic_forest".to_string());
    metadata.insert("donation_type".to_string(), "one-time".to_string());

    IntentRequest {
        amount_minor,
        currency: "usd".to_string(),
        description: "Magic Forest Donation".to_string(),
        metadata,
    }
}

#[tokio::test]
async fn test_create_intent_sends_form_with_bearer_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/payment_intents"))
        .and(header("authorization", format!("Bearer {}", KEY).as_str()))
        .and(body_string_contains("amount=2500"))
        .and(body_string_contains("currency=usd"))
        .and(body_string_contains("magic_forest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pi_123",
            "object": "payment_intent",
            "client_secret": "pi_123_secret_456"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let intent = gateway(&server)
        .create_intent(intent_request(2500))
        .await
        .unwrap();

    assert_eq!(intent.id, "pi_123");
    assert_eq!(intent.client_secret, "pi_123_secret_456");
}

#[tokio::test]
async fn test_error_envelope_becomes_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/payment_intents"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "type": "invalid_request_error",
                "message": "Invalid API Key provided: sk_test_****rest"
            }
        })))
        .mount(&server)
        .await;

    let err = gateway(&server)
        .create_intent(intent_request(2500))
        .await
        .unwrap_err();

    assert_eq!(err.message, "Invalid API Key provided: sk_test_****rest");
}

#[tokio::test]
async fn test_malformed_response_becomes_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = gateway(&server)
        .create_checkout_session(CheckoutRequest {
            mode: CheckoutMode::Payment,
            line_item: LineItem {
                name: "Magic Forest Donation".to_string(),
                description: "One-time donation to support The Magic Forest".to_string(),
                unit_amount_minor: 1000,
                currency: "usd".to_string(),
                recurring_interval: None,
            },
            customer_email: None,
            success_url: "http://localhost:3000/confirmation".to_string(),
            cancel_url: "http://localhost:3000/donate".to_string(),
            metadata: BTreeMap::new(),
        })
        .await
        .unwrap_err();

    assert!(err.message.starts_with("Invalid Stripe response"), "{}", err.message);
}

#[tokio::test]
async fn test_create_checkout_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .and(body_string_contains("mode=subscription"))
        .and(body_string_contains("customer_email=donor%40example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_abc",
            "url": "https://checkout.stripe.com/c/pay/cs_test_abc"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = gateway(&server)
        .create_checkout_session(CheckoutRequest {
            mode: CheckoutMode::Subscription,
            line_item: LineItem {
                name: "Magic Forest Ranger Plan".to_string(),
                description: "Monthly donation to Magic Forest - Ranger tier".to_string(),
                unit_amount_minor: 3000,
                currency: "usd".to_string(),
                recurring_interval: Some("month".to_string()),
            },
            customer_email: Some("donor@example.com".to_string()),
            success_url: "http://localhost:3000/confirmation".to_string(),
            cancel_url: "http://localhost:3000/donate".to_string(),
            metadata: BTreeMap::new(),
        })
        .await
        .unwrap();

    assert_eq!(session.id, "cs_test_abc");
    assert_eq!(session.url, "https://checkout.stripe.com/c/pay/cs_test_abc");
}

#[tokio::test]
async fn test_retrieve_session_reads_customer_details() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/checkout/sessions/cs_test_paid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_paid",
            "status": "complete",
            "payment_status": "paid",
            "customer_email": null,
            "customer_details": {"email": "donor@example.com", "name": "Ada"},
            "metadata": {"donation_type": "recurring", "plan": "guardian", "amount": "15"}
        })))
        .mount(&server)
        .await;

    let session = gateway(&server)
        .retrieve_session("cs_test_paid")
        .await
        .unwrap();

    assert_eq!(session.status.as_deref(), Some("complete"));
    assert_eq!(session.payment_status.as_deref(), Some("paid"));
    assert_eq!(session.customer_email.as_deref(), Some("donor@example.com"));
    assert_eq!(session.metadata["plan"], "guardian");
}

#[tokio::test]
async fn test_unsafe_session_id_never_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = gateway(&server)
        .retrieve_session("../payment_intents")
        .await
        .unwrap_err();

    assert!(err.message.contains("Invalid checkout session id"));
}
