//! Integration tests for the Stripe webhook endpoint.
//!
//! Requests go through the real router with an in-memory record store and a
//! mock provider that checks signatures with a fixed secret.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use billing_bridge::adapters::auth::MockSessionValidator;
use billing_bridge::adapters::http::{billing_router, BillingAppState};
use billing_bridge::adapters::storage::InMemoryRecordStore;
use billing_bridge::adapters::stripe::MockPaymentProvider;
use billing_bridge::application::handlers::billing::SessionUrls;
use billing_bridge::domain::billing::generate_signature_header;
use billing_bridge::domain::foundation::{Collection, Record, RecordId};
use billing_bridge::ports::RecordStore;

const SECRET: &str = "whsec_integration";

// =============================================================================
// Test Infrastructure
// =============================================================================

fn app(store: &InMemoryRecordStore) -> Router {
    billing_router(BillingAppState {
        record_store: Arc::new(store.clone()),
        payment_provider: Arc::new(MockPaymentProvider::with_webhook_secret(SECRET)),
        session_validator: Arc::new(MockSessionValidator::new()),
        urls: SessionUrls {
            success_url: "https://app.example.com/account".to_string(),
            cancel_url: "https://app.example.com/pricing".to_string(),
            billing_return_url: "https://app.example.com/account".to_string(),
        },
    })
}

fn webhook_request(event: &Value, secret: &str) -> Request<Body> {
    let payload = serde_json::to_vec(event).unwrap();
    let signature =
        generate_signature_header(secret, chrono::Utc::now().timestamp(), &payload).unwrap();
    Request::builder()
        .method("POST")
        .uri("/stripe")
        .header("content-type", "application/json")
        .header("Stripe-Signature", signature)
        .body(Body::from(payload))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn event(event_type: &str, object: Value) -> Value {
    json!({
        "id": "evt_integration",
        "type": event_type,
        "created": 1_700_000_000,
        "data": {"object": object}
    })
}

fn product_object(name: &str) -> Value {
    json!({"id": "prod_test", "active": true, "name": name, "metadata": {}})
}

fn subscription_object(customer: &str) -> Value {
    json!({
        "id": "sub_test",
        "customer": customer,
        "status": "active",
        "cancel_at_period_end": false,
        "current_period_start": 1_700_000_000,
        "current_period_end": 1_702_592_000,
        "default_payment_method": {
            "id": "pm_test",
            "type": "card",
            "customer": {"id": customer, "address": {"country": "US", "postal_code": "94107"}}
        },
        "items": {"data": [{
            "id": "si_test",
            "created": 1_700_000_000,
            "quantity": 1,
            "price": {"id": "price_test", "product": "prod_test", "active": true,
                      "currency": "usd", "type": "recurring"}
        }]}
    })
}

async fn map_customer(store: &InMemoryRecordStore, user_id: &str, stripe_id: &str) {
    let mut record = Record::new(Collection::Customer);
    record.set("user_id", user_id);
    record.set("stripe_customer_id", stripe_id);
    store.save(record).await.unwrap();
}

async fn seed_user(store: &InMemoryRecordStore, user_id: &str) {
    let mut fields = serde_json::Map::new();
    fields.insert("email".into(), json!("member@example.com"));
    store
        .seed(Record::from_parts(
            RecordId::new(user_id).unwrap(),
            Collection::Users,
            fields,
        ))
        .await;
}

// =============================================================================
// Products and Prices
// =============================================================================

#[tokio::test]
async fn signed_product_event_is_stored_and_acknowledged() {
    let store = InMemoryRecordStore::with_all_collections();

    let (status, body) = send(
        app(&store),
        webhook_request(&event("product.created", product_object("Test product")), SECRET),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": "data was received"}));

    let products = store.records(Collection::Product).await;
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].get_str("product_id"), Some("prod_test"));
    assert_eq!(products[0].get_str("name"), Some("Test product"));
    assert_eq!(products[0].get_bool("active"), Some(true));
}

#[tokio::test]
async fn redelivered_product_event_updates_in_place() {
    let store = InMemoryRecordStore::with_all_collections();

    send(
        app(&store),
        webhook_request(&event("product.created", product_object("First")), SECRET),
    )
    .await;
    let (status, _) = send(
        app(&store),
        webhook_request(&event("product.updated", product_object("Second")), SECRET),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let products = store.records(Collection::Product).await;
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].get_str("name"), Some("Second"));
}

#[tokio::test]
async fn price_event_is_stored() {
    let store = InMemoryRecordStore::with_all_collections();
    let price = json!({
        "id": "price_test",
        "product": "prod_test",
        "active": true,
        "currency": "usd",
        "nickname": "Monthly",
        "type": "recurring",
        "unit_amount": 1200,
        "recurring": {"interval": "month", "interval_count": 1}
    });

    let (status, _) = send(app(&store), webhook_request(&event("price.created", price), SECRET)).await;

    assert_eq!(status, StatusCode::OK);
    let prices = store.records(Collection::Price).await;
    assert_eq!(prices[0].get_str("price_id"), Some("price_test"));
    assert_eq!(prices[0].get_str("description"), Some("Monthly"));
    assert_eq!(prices[0].get_str("interval"), Some("month"));
    assert_eq!(prices[0].get_i64("unit_amount"), Some(1200));
}

// =============================================================================
// Rejections
// =============================================================================

#[tokio::test]
async fn foreign_signature_is_rejected_without_writes() {
    let store = InMemoryRecordStore::with_all_collections();

    let (status, body) = send(
        app(&store),
        webhook_request(&event("product.created", product_object("x")), "whsec_other"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"failure": "webhook verification failed"}));
    assert_eq!(store.count(Collection::Product).await, 0);
}

#[tokio::test]
async fn missing_signature_header_is_rejected() {
    let store = InMemoryRecordStore::with_all_collections();
    let request = Request::builder()
        .method("POST")
        .uri("/stripe")
        .body(Body::from(
            serde_json::to_vec(&event("product.created", product_object("x"))).unwrap(),
        ))
        .unwrap();

    let (status, _) = send(app(&store), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.count(Collection::Product).await, 0);
}

#[tokio::test]
async fn unhandled_event_type_is_reported() {
    let store = InMemoryRecordStore::with_all_collections();

    let (status, body) = send(
        app(&store),
        webhook_request(&event("invoice.paid", json!({"id": "in_1"})), SECRET),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"failure": "didn't receive a valid event"}));
}

#[tokio::test]
async fn missing_collection_is_server_error() {
    let store = InMemoryRecordStore::new();

    let (status, body) = send(
        app(&store),
        webhook_request(&event("product.created", product_object("x")), SECRET),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"failure": "could not find collection product"}));
}

// =============================================================================
// Subscriptions and Checkout
// =============================================================================

#[tokio::test]
async fn subscription_for_unknown_customer_writes_nothing() {
    let store = InMemoryRecordStore::with_all_collections();

    let (status, body) = send(
        app(&store),
        webhook_request(
            &event("customer.subscription.updated", subscription_object("cus_nobody")),
            SECRET,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"failure": "no customer"}));
    assert_eq!(store.count(Collection::Subscription).await, 0);
}

#[tokio::test]
async fn created_subscription_is_stored_and_profile_updated() {
    let store = InMemoryRecordStore::with_all_collections();
    map_customer(&store, "user_42", "cus_test").await;
    seed_user(&store, "user_42").await;

    let (status, _) = send(
        app(&store),
        webhook_request(
            &event("customer.subscription.created", subscription_object("cus_test")),
            SECRET,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let subscriptions = store.records(Collection::Subscription).await;
    assert_eq!(subscriptions.len(), 1);
    assert_eq!(subscriptions[0].get_str("user_id"), Some("user_42"));
    assert_eq!(subscriptions[0].get_str("price_id"), Some("price_test"));
    assert_eq!(subscriptions[0].get_str("status"), Some("active"));

    let users = store.records(Collection::Users).await;
    assert_eq!(users[0].get_str("payment_method"), Some("card"));
    assert_eq!(users[0].get("billing_address").unwrap()["country"], "US");
}

#[tokio::test]
async fn subscription_update_replaces_created_record() {
    let store = InMemoryRecordStore::with_all_collections();
    map_customer(&store, "user_42", "cus_test").await;
    seed_user(&store, "user_42").await;

    send(
        app(&store),
        webhook_request(
            &event("customer.subscription.created", subscription_object("cus_test")),
            SECRET,
        ),
    )
    .await;

    let mut changed = subscription_object("cus_test");
    changed["status"] = json!("past_due");
    changed["cancel_at_period_end"] = json!(true);
    let (status, _) = send(
        app(&store),
        webhook_request(&event("customer.subscription.updated", changed), SECRET),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let subscriptions = store.records(Collection::Subscription).await;
    assert_eq!(subscriptions.len(), 1);
    assert_eq!(subscriptions[0].get_str("subscription_id"), Some("sub_test"));
    assert_eq!(subscriptions[0].get_str("status"), Some("past_due"));
    assert_eq!(subscriptions[0].get_bool("cancel_at_period_end"), Some(true));
}

#[tokio::test]
async fn subscription_checkout_stores_embedded_subscription() {
    let store = InMemoryRecordStore::with_all_collections();
    map_customer(&store, "user_42", "cus_test").await;
    seed_user(&store, "user_42").await;
    let session = json!({
        "id": "cs_test",
        "mode": "subscription",
        "customer": "cus_test",
        "subscription": subscription_object("cus_test")
    });

    let (status, _) = send(
        app(&store),
        webhook_request(&event("checkout.session.completed", session), SECRET),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.count(Collection::Subscription).await, 1);
}

#[tokio::test]
async fn payment_checkout_is_acknowledged_without_writes() {
    let store = InMemoryRecordStore::with_all_collections();
    let session = json!({"id": "cs_test", "mode": "payment", "customer": "cus_test"});

    let (status, body) = send(
        app(&store),
        webhook_request(&event("checkout.session.completed", session), SECRET),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], "data was received");
    assert_eq!(store.count(Collection::Subscription).await, 0);
}
