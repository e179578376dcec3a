// HTTP tests for the pricing API
// Every test runs the real router over an in-memory store

use super::*;
use axum::http::StatusCode;
use axum_test::TestServer;
use crate::repository::MemoryStore;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::str::FromStr;

// ============================================================================
// Test Helpers
// ============================================================================

const SEED: &str = r#"{
    "products": [
        { "id": "p1", "name": "Statuario", "category": "Marble", "basePrice": 1000 },
        { "id": "p2", "name": "Black Galaxy", "category": "Granite", "basePrice": 999.99 },
        { "id": "p3", "name": "Corrupt Slab", "category": "Marble", "basePrice": "n/a" },
        { "id": "p4", "name": "Kashmir White", "category": "Granite", "basePrice": 333.33 },
        { "id": "p5", "name": "Honey Onyx", "category": "Onyx", "basePrice": 10.05 }
    ],
    "agents": [
        { "id": "a1", "name": "Override Agent", "commissionRate": 8, "categoryCommissions": { "Granite": 3 } },
        { "id": "a2", "name": "Five Percent", "commissionRate": 5 },
        { "id": "a3", "name": "Twelve And A Half", "commissionRate": "12.5" }
    ],
    "clients": [
        { "id": "c-red", "name": "Red Client", "consultantLevel": "red" },
        { "id": "c-yellow", "name": "Yellow Client", "consultantLevel": "yellow" },
        { "id": "c-purple", "name": "Purple Client", "consultantLevel": "purple" },
        { "id": "c-none", "name": "No Tier", "consultantLevel": "none" },
        { "id": "c-unset", "name": "Unset Tier" }
    ]
}"#;

fn seeded_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::from_json(SEED).expect("seed parses"))
}

fn create_test_server(store: Arc<MemoryStore>) -> TestServer {
    let state = AppState::new(Repositories::memory(store), PricingSettings::default());
    TestServer::new(create_router(state)).unwrap()
}

/// Money and rates are JSON strings; compare them as decimals
fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal serialized as string")).unwrap()
}

async fn add_to_cart(server: &TestServer, body: Value) -> Value {
    let response = server.post("/api/cart/items").json(&body).await;
    assert_eq!(response.status_code(), StatusCode::CREATED, "{}", response.text());
    response.json()
}

// ============================================================================
// Catalog pricing
// ============================================================================

/// basePrice=1000, agent 5%, consultant 10% -> 50.00 + 100.00 -> 1150.00
#[tokio::test]
async fn test_listing_prices_reference_scenario() {
    let server = create_test_server(seeded_store());

    let response = server
        .get("/api/products")
        .add_query_param("clientId", "c-yellow")
        .add_query_param("agentId", "a2")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let page: Value = response.json();
    let p1 = &page["items"][0];
    assert_eq!(p1["id"], "p1");
    assert_eq!(p1["originalPrice"], json!(1000.0));
    assert_eq!(p1["calculatedPrice"], json!(1150.0));
    assert_eq!(decimal(&p1["commissionInfo"]["agentCommissionAmount"]), dec!(50.00));
    assert_eq!(decimal(&p1["commissionInfo"]["consultantCommissionAmount"]), dec!(100.00));
    assert_eq!(decimal(&p1["commissionInfo"]["totalRate"]), dec!(15));
    assert_eq!(p1["commissionInfo"]["isGlobalRate"], false);
    assert_eq!(p1["commissionInfo"]["consultantLevel"], "yellow");
}

/// basePrice=999.99 at 12.5% -> round2(124.99875) = 125.00 -> 1124.99
#[tokio::test]
async fn test_single_product_half_up_scenario() {
    let server = create_test_server(seeded_store());

    let response = server
        .get("/api/products/p2")
        .add_query_param("agentId", "a3")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let product: Value = response.json();
    assert_eq!(decimal(&product["commissionInfo"]["agentCommissionAmount"]), dec!(125.00));
    assert_eq!(decimal(&product["commissionInfo"]["consultantCommissionAmount"]), dec!(0));
    assert_eq!(product["calculatedPrice"], json!(1124.99));
}

#[tokio::test]
async fn test_batch_with_one_corrupt_price_prices_the_rest() {
    let server = create_test_server(seeded_store());

    let response = server
        .get("/api/products")
        .add_query_param("agentId", "a2")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let page: Value = response.json();
    let items = page["items"].as_array().unwrap();
    assert_eq!(items.len(), 5);
    assert_eq!(page["total"], 5);

    let ids: Vec<&str> = items.iter().map(|p| p["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["p1", "p2", "p3", "p4", "p5"]);

    let corrupt = &items[2];
    assert!(corrupt["commissionInfo"]["error"].is_string());
    // NaN has no JSON form; the estimate is its own (invalid) base price
    assert_eq!(corrupt["calculatedPrice"], Value::Null);
    assert_eq!(corrupt["originalPrice"], Value::Null);

    for (i, item) in items.iter().enumerate().filter(|(i, _)| *i != 2) {
        assert!(item["commissionInfo"].get("error").is_none(), "item {} flagged", i);
    }
    assert_eq!(items[0]["calculatedPrice"], json!(1050.0));
}

#[tokio::test]
async fn test_category_override_replaces_global_rate() {
    let server = create_test_server(seeded_store());

    let page: Value = server
        .get("/api/products")
        .add_query_param("agentId", "a1")
        .await
        .json();
    let items = page["items"].as_array().unwrap();

    let marble = &items[0];
    assert_eq!(decimal(&marble["commissionInfo"]["agentCommissionRate"]), dec!(8));
    assert_eq!(marble["commissionInfo"]["categoryOverride"], false);

    let granite = &items[3];
    assert_eq!(granite["id"], "p4");
    assert_eq!(decimal(&granite["commissionInfo"]["agentCommissionRate"]), dec!(3));
    assert_eq!(decimal(&granite["commissionInfo"]["totalRate"]), dec!(3));
    assert_eq!(granite["commissionInfo"]["categoryOverride"], true);
    assert_eq!(decimal(&granite["commissionInfo"]["agentCommissionAmount"]), dec!(10.00));
}

#[tokio::test]
async fn test_consultant_table_through_listing() {
    let server = create_test_server(seeded_store());

    let cases = [
        ("c-red", dec!(5)),
        ("c-yellow", dec!(10)),
        ("c-purple", dec!(15)),
        ("c-none", dec!(0)),
        ("c-unset", dec!(0)),
    ];

    for (client, expected) in cases {
        let product: Value = server
            .get("/api/products/p1")
            .add_query_param("clientId", client)
            .await
            .json();
        assert_eq!(
            decimal(&product["commissionInfo"]["consultantLevelRate"]),
            expected,
            "client {}",
            client
        );
    }
}

#[tokio::test]
async fn test_missing_agent_and_client_degrade_softly() {
    let server = create_test_server(seeded_store());

    let response = server
        .get("/api/products/p1")
        .add_query_param("clientId", "nobody")
        .add_query_param("agentId", "ghost")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let product: Value = response.json();
    assert_eq!(product["commissionInfo"]["isGlobalRate"], true);
    assert_eq!(product["commissionInfo"]["consultantName"], "Default");
    assert_eq!(product["calculatedPrice"], json!(1000.0));
}

#[tokio::test]
async fn test_malformed_id_is_rejected() {
    let server = create_test_server(seeded_store());

    let response = server
        .get("/api/products")
        .add_query_param("agentId", "a1; DROP TABLE agents")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["error_code"], "INVALID_ARGUMENT");
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn test_listing_filters_and_pagination() {
    let server = create_test_server(seeded_store());

    let page: Value = server
        .get("/api/products")
        .add_query_param("category", "granite")
        .add_query_param("sort", "price")
        .add_query_param("order", "desc")
        .add_query_param("limit", "1")
        .await
        .json();

    assert_eq!(page["total"], 2);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["items"][0]["id"], "p2");

    let response = server
        .get("/api/products")
        .add_query_param("minPrice", "500")
        .add_query_param("maxPrice", "100")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let server = create_test_server(seeded_store());
    let response = server.get("/api/products/p404").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unavailable_store_is_retryable() {
    let store = seeded_store();
    let server = create_test_server(store.clone());
    store.set_unavailable(true);

    let response = server.get("/api/products").await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = response.json();
    assert_eq!(body["error_code"], "UPSTREAM_UNAVAILABLE");
    assert_eq!(body["retryable"], true);

    let response = server
        .post("/api/cart/items")
        .json(&json!({ "productId": "p1", "quantity": 1, "clientId": "c-red" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

// ============================================================================
// Cart, refresh and checkout
// ============================================================================

#[tokio::test]
async fn test_add_to_cart_attaches_breakdown() {
    let server = create_test_server(seeded_store());

    let line = add_to_cart(
        &server,
        json!({
            "productId": "p1",
            "quantity": 2,
            "clientId": "c-yellow",
            "agentId": "a2",
            "customFields": { "finish": "polished" }
        }),
    )
    .await;

    assert_eq!(line["quantity"], 2);
    assert_eq!(decimal(&line["price"]), dec!(1150.00));
    assert_eq!(decimal(&line["basePrice"]), dec!(1000));
    assert_eq!(decimal(&line["breakdown"]["finalPrice"]), dec!(1150.00));
    assert_eq!(line["customFields"]["finish"], "polished");

    let cart: Value = server
        .get("/api/cart")
        .add_query_param("clientId", "c-yellow")
        .await
        .json();
    assert_eq!(decimal(&cart["subtotal"]), dec!(2300.00));
    assert_eq!(cart["agentId"], "a2");
}

#[tokio::test]
async fn test_add_to_cart_validation() {
    let server = create_test_server(seeded_store());

    let response = server
        .post("/api/cart/items")
        .json(&json!({ "productId": "p1", "quantity": 0, "clientId": "c-red" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error_code"], "VALIDATION_ERROR");

    let response = server
        .post("/api/cart/items")
        .json(&json!({ "productId": "p404", "quantity": 1, "clientId": "c-red" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server
        .post("/api/cart/items")
        .json(&json!({ "productId": "p3", "quantity": 1, "clientId": "c-red" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_repeat_add_respects_quantity_cap() {
    let server = create_test_server(seeded_store());
    add_to_cart(&server, json!({ "productId": "p1", "quantity": 10000, "clientId": "c-red" })).await;

    let response = server
        .post("/api/cart/items")
        .json(&json!({ "productId": "p1", "quantity": 10000, "clientId": "c-red" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let cart: Value = server
        .get("/api/cart")
        .add_query_param("clientId", "c-red")
        .await
        .json();
    assert_eq!(cart["items"][0]["quantity"], 10000);
}

#[tokio::test]
async fn test_order_agent_matches_every_frozen_line() {
    let server = create_test_server(seeded_store());
    add_to_cart(
        &server,
        json!({ "productId": "p1", "quantity": 1, "clientId": "c-none", "agentId": "a2" }),
    )
    .await;
    let line = add_to_cart(&server, json!({ "productId": "p5", "quantity": 1, "clientId": "c-none" })).await;
    assert_eq!(decimal(&line["breakdown"]["agentCommissionRate"]), dec!(5));

    let order: Value = server
        .post("/api/orders")
        .json(&json!({ "clientId": "c-none" }))
        .await
        .json();
    assert_eq!(order["agentId"], "a2");
    for item in order["items"].as_array().unwrap() {
        assert_eq!(decimal(&item["breakdown"]["agentCommissionRate"]), dec!(5));
    }
}

#[tokio::test]
async fn test_cart_price_is_cached_until_explicit_refresh() {
    let server = create_test_server(seeded_store());

    add_to_cart(
        &server,
        json!({ "productId": "p1", "quantity": 1, "clientId": "c-red", "agentId": "a2" }),
    )
    .await;

    let response = server
        .put("/api/clients/c-red/consultant-level")
        .json(&json!({ "consultantLevel": "purple" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    // editing quantity never re-prices
    let line: Value = server
        .patch("/api/cart/items/p1")
        .json(&json!({ "clientId": "c-red", "quantity": 3 }))
        .await
        .json();
    assert_eq!(line["quantity"], 3);
    assert_eq!(decimal(&line["price"]), dec!(1100.00));

    let cart: Value = server
        .get("/api/cart")
        .add_query_param("clientId", "c-red")
        .await
        .json();
    assert_eq!(decimal(&cart["items"][0]["price"]), dec!(1100.00));

    let response = server
        .post("/api/cart/refresh-pricing")
        .json(&json!({ "clientId": "c-red" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let items: Value = response.json();
    assert_eq!(decimal(&items[0]["price"]), dec!(1200.00));
    assert_eq!(decimal(&items[0]["breakdown"]["consultantLevelRate"]), dec!(15));
    assert_eq!(items[0]["quantity"], 3);
}

#[tokio::test]
async fn test_remove_cart_item() {
    let server = create_test_server(seeded_store());
    add_to_cart(&server, json!({ "productId": "p1", "quantity": 1, "clientId": "c-red" })).await;

    let response = server
        .delete("/api/cart/items/p1")
        .add_query_param("clientId", "c-red")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let cart: Value = response.json();
    assert_eq!(cart["items"].as_array().unwrap().len(), 0);

    let response = server
        .delete("/api/cart/items/p1")
        .add_query_param("clientId", "c-red")
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

/// An order keeps the breakdown its cart line carried, whatever happens to
/// the agent afterwards
#[tokio::test]
async fn test_order_breakdown_survives_commission_change() {
    let server = create_test_server(seeded_store());

    let line = add_to_cart(
        &server,
        json!({ "productId": "p4", "quantity": 3, "clientId": "c-yellow", "agentId": "a2" }),
    )
    .await;
    let cart_breakdown = line["breakdown"].clone();

    let response = server
        .post("/api/orders")
        .json(&json!({ "clientId": "c-yellow" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let order: Value = response.json();
    let order_id = order["id"].as_str().unwrap().to_string();

    assert_eq!(order["status"], "pending");
    assert_eq!(order["items"][0]["breakdown"], cart_breakdown);
    assert!(order["orderNumber"].as_str().unwrap().starts_with("ORD-"));

    let response = server
        .put("/api/agents/a2/commission")
        .json(&json!({ "commissionRate": 40 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let refetched: Value = server.get(&format!("/api/orders/{}", order_id)).await.json();
    assert_eq!(refetched["items"][0]["breakdown"], cart_breakdown);
    assert_eq!(
        serde_json::to_string(&refetched["items"][0]["breakdown"]).unwrap(),
        serde_json::to_string(&cart_breakdown).unwrap()
    );
    assert_eq!(refetched["total"], order["total"]);

    // the live catalog does see the new rate
    let product: Value = server
        .get("/api/products/p4")
        .add_query_param("agentId", "a2")
        .await
        .json();
    assert_eq!(decimal(&product["commissionInfo"]["agentCommissionRate"]), dec!(40));
}

#[tokio::test]
async fn test_checkout_totals_and_cart_cleared() {
    let server = create_test_server(seeded_store());
    add_to_cart(&server, json!({ "productId": "p1", "quantity": 2, "clientId": "c-red" })).await;
    add_to_cart(&server, json!({ "productId": "p5", "quantity": 4, "clientId": "c-red" })).await;

    let order: Value = server
        .post("/api/orders")
        .json(&json!({ "clientId": "c-red" }))
        .await
        .json();

    // 1050.00 * 2 + (10.05 + 0.50) * 4
    assert_eq!(decimal(&order["items"][0]["lineTotal"]), dec!(2100.00));
    assert_eq!(decimal(&order["items"][1]["lineTotal"]), dec!(42.20));
    assert_eq!(decimal(&order["subtotal"]), dec!(2142.20));

    let cart: Value = server
        .get("/api/cart")
        .add_query_param("clientId", "c-red")
        .await
        .json();
    assert_eq!(cart["items"].as_array().unwrap().len(), 0);

    let orders: Value = server
        .get("/api/orders")
        .add_query_param("clientId", "c-red")
        .await
        .json();
    assert_eq!(orders.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_checkout_of_empty_cart_is_rejected() {
    let server = create_test_server(seeded_store());

    let response = server
        .post("/api/orders")
        .json(&json!({ "clientId": "c-red" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_order_status_transitions() {
    let server = create_test_server(seeded_store());
    add_to_cart(&server, json!({ "productId": "p1", "quantity": 1, "clientId": "c-red" })).await;
    let order: Value = server
        .post("/api/orders")
        .json(&json!({ "clientId": "c-red" }))
        .await
        .json();
    let path = format!("/api/orders/{}/status", order["id"].as_str().unwrap());

    let response = server.patch(&path).json(&json!({ "status": "confirmed" })).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let confirmed: Value = response.json();
    assert_eq!(confirmed["status"], "confirmed");
    assert_eq!(confirmed["items"], order["items"]);

    let response = server.patch(&path).json(&json!({ "status": "pending" })).await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);

    let response = server
        .patch(&format!("/api/orders/{}/status", uuid::Uuid::new_v4()))
        .json(&json!({ "status": "confirmed" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Wishlist
// ============================================================================

#[tokio::test]
async fn test_wishlist_flow() {
    let server = create_test_server(seeded_store());

    let response = server
        .post("/api/wishlist/items")
        .json(&json!({ "productId": "p2", "clientId": "c-purple", "agentId": "a1" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let item: Value = response.json();
    // granite override 3% + purple 15%
    assert_eq!(decimal(&item["breakdown"]["totalRate"]), dec!(18));

    server
        .put("/api/clients/c-purple/consultant-level")
        .json(&json!({ "consultantLevel": "red" }))
        .await;

    let wishlist: Value = server
        .get("/api/wishlist")
        .add_query_param("clientId", "c-purple")
        .await
        .json();
    assert_eq!(decimal(&wishlist["items"][0]["breakdown"]["totalRate"]), dec!(18));

    let refreshed: Value = server
        .post("/api/wishlist/refresh-pricing")
        .json(&json!({ "clientId": "c-purple" }))
        .await
        .json();
    assert_eq!(decimal(&refreshed[0]["breakdown"]["totalRate"]), dec!(8));

    let response = server
        .delete("/api/wishlist/items/p2")
        .add_query_param("clientId", "c-purple")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

// ============================================================================
// Settings and health
// ============================================================================

#[tokio::test]
async fn test_commission_settings_are_validated() {
    let server = create_test_server(seeded_store());

    let response = server
        .put("/api/agents/a1/commission")
        .json(&json!({ "commissionRate": 101 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = server
        .put("/api/agents/nobody/commission")
        .json(&json!({ "commissionRate": 10 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server
        .put("/api/agents/a1/commission")
        .json(&json!({ "commissionRate": "7.5", "categoryCommissions": { "Onyx": 2 } }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let agent: Value = response.json();
    assert_eq!(decimal(&agent["commissionRate"]), dec!(7.5));
}

#[tokio::test]
async fn test_health_reports_pricing_metrics() {
    let server = create_test_server(seeded_store());
    server
        .get("/api/products")
        .add_query_param("agentId", "a2")
        .await;

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let health: Value = response.json();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["pricing"]["listings"], 1);
    assert_eq!(health["pricing"]["itemsPriced"], 4);
    assert_eq!(health["pricing"]["itemFailures"], 1);
    assert!(health["rateCacheEntries"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let server = create_test_server(seeded_store());
    let response = server.get("/api-docs/openapi.json").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let doc: Value = response.json();
    assert!(doc["paths"]["/api/products"].is_object());
    assert!(doc["paths"]["/api/orders/{order_id}/status"].is_object());
}
