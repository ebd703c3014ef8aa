//! Integration tests for the WING and retail clients using wiremock HTTP mocks.

use rocketlens_wing::{RetailClient, WingClient, WingError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_PATH: &str = "/tenants/rg/pre-matching/search";
const RETURN_PATH: &str = "/tenants/rfm/goldfish/vendor-return/itemList";
const QUANTITY_PATH: &str = "/next-api/products/quantity-info";

fn wing_client(base_url: &str) -> WingClient {
    WingClient::with_base_url(base_url, Some("tok-1".to_owned()), 30, "rocketlens-test/0.1")
        .expect("client construction should not fail")
}

fn search_row(product_id: i64, item_id: i64) -> serde_json::Value {
    json!({
        "productId": product_id,
        "itemId": item_id,
        "vendorItemId": item_id * 10,
        "productName": "Stainless Tumbler",
        "brandName": "Acme",
        "pvLast28Day": 1000,
        "salesLast28d": 50,
        "salePrice": 12900
    })
}

#[tokio::test]
async fn search_by_keyword_parses_results_and_sends_the_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("keyword", "tumbler"))
        .and(header("x-xsrf-token", "tok-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "result": [search_row(1, 2)], "hasNext": false })),
        )
        .mount(&server)
        .await;

    let results = wing_client(&server.uri())
        .search_by_keyword("tumbler")
        .await
        .expect("should parse search results");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].product_id, 1);
    assert_eq!(results[0].brand_name.as_deref(), Some("Acme"));
    assert_eq!(results[0].sales_last_28d, Some(50.0));
}

#[tokio::test]
async fn missing_session_token_fails_before_any_request() {
    let server = MockServer::start().await;
    // No mock mounted: a request reaching the server would 404 and surface
    // as SearchFailed rather than Unauthenticated.
    let client = WingClient::with_base_url(&server.uri(), None, 30, "rocketlens-test/0.1").unwrap();

    let result = client.search_by_keyword("tumbler").await;
    assert!(matches!(result, Err(WingError::Unauthenticated)));
    assert!(result.unwrap_err().requires_login());
}

#[tokio::test]
async fn rate_limit_status_maps_to_its_own_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "42"))
        .mount(&server)
        .await;

    let result = wing_client(&server.uri()).search_by_keyword("x").await;
    assert!(matches!(
        result,
        Err(WingError::RateLimited {
            retry_after_secs: Some(42)
        })
    ));
}

#[tokio::test]
async fn non_success_status_maps_to_search_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let result = wing_client(&server.uri()).search_by_keyword("x").await;
    match result {
        Err(WingError::SearchFailed { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected SearchFailed, got: {other:?}"),
    }
}

#[tokio::test]
async fn expired_session_status_requires_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = wing_client(&server.uri())
        .search_by_keyword("x")
        .await
        .unwrap_err();
    assert!(err.requires_login());
}

#[tokio::test]
async fn fetch_single_filters_for_the_exact_item() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("keyword", "456"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [search_row(1, 455), search_row(1, 456), search_row(2, 457)]
        })))
        .mount(&server)
        .await;

    let product = wing_client(&server.uri())
        .fetch_single("456")
        .await
        .expect("exact match exists");
    assert_eq!(product.item_id, 456);
}

#[tokio::test]
async fn fetch_single_without_exact_match_is_empty_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "result": [search_row(1, 999)] })),
        )
        .mount(&server)
        .await;

    let result = wing_client(&server.uri()).fetch_single("456").await;
    match result {
        Err(WingError::EmptyResult { item_id }) => assert_eq!(item_id, "456"),
        other => panic!("expected EmptyResult, got: {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Vendor return collection
// ---------------------------------------------------------------------------

fn return_item(vendor_item_id: i64) -> serde_json::Value {
    json!({
        "vendorItemId": vendor_item_id,
        "skuId": vendor_item_id + 1,
        "productId": vendor_item_id + 2,
        "returnableQtyTotal": 3,
        "returnableQtyByFCTotal": { "XRC1": {"qty": 3, "fcName": "Incheon"} }
    })
}

#[tokio::test]
async fn return_collection_walks_pages_until_a_short_page() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RETURN_PATH))
        .and(header("x-xsrf-token", "tok-1"))
        .and(body_partial_json(json!({ "pageIndex": 0, "pageSize": 2 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [return_item(1), return_item(2)],
            "totalElements": 3
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(RETURN_PATH))
        .and(body_partial_json(json!({ "pageIndex": 1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [return_item(3)],
            "totalElements": 3
        })))
        .mount(&server)
        .await;

    let collection = wing_client(&server.uri())
        .fetch_return_items(2)
        .await
        .expect("collection should succeed");

    assert!(collection.complete);
    assert_eq!(collection.items.len(), 3);
}

#[tokio::test]
async fn return_collection_stops_on_an_empty_first_page() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(RETURN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "content": [], "totalElements": 0 })),
        )
        .mount(&server)
        .await;

    let collection = wing_client(&server.uri()).fetch_return_items(50).await.unwrap();
    assert!(collection.complete);
    assert!(collection.items.is_empty());
}

#[tokio::test]
async fn return_collection_keeps_partial_items_on_mid_walk_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RETURN_PATH))
        .and(body_partial_json(json!({ "pageIndex": 0 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [return_item(1), return_item(2)],
            "totalElements": 10
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(RETURN_PATH))
        .and(body_partial_json(json!({ "pageIndex": 1 })))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let collection = wing_client(&server.uri()).fetch_return_items(2).await.unwrap();
    assert!(!collection.complete);
    assert_eq!(collection.items.len(), 2);
}

#[tokio::test]
async fn return_collection_first_page_failure_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(RETURN_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = wing_client(&server.uri()).fetch_return_items(50).await;
    assert!(matches!(
        result,
        Err(WingError::UnexpectedStatus { status: 500, .. })
    ));
}

// ---------------------------------------------------------------------------
// Price validation
// ---------------------------------------------------------------------------

fn retail_client(base_url: &str) -> RetailClient {
    RetailClient::with_base_url(base_url, 30, "rocketlens-test/0.1")
        .expect("client construction should not fail")
}

fn quantity_body(prices: &[&str]) -> serde_json::Value {
    let items: Vec<serde_json::Value> = prices
        .iter()
        .enumerate()
        .map(|(i, price)| {
            json!({
                "priceInfo": { "finalPrice": price },
                "itemBasicInfo": { "itemId": i + 1, "itemName": format!("option {i}"), "vendorItemId": (i + 1) * 10 },
                "stockInfo": { "soldOut": false }
            })
        })
        .collect();
    json!({ "moduleData": [{ "viewType": "PRODUCT_DETAIL_OPTION_LIST", "items": items }] })
}

#[tokio::test]
async fn price_validation_flags_diverging_options() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(QUANTITY_PATH))
        .and(query_param("productId", "77"))
        .and(query_param("vendorItemId", "10"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(quantity_body(&["1,000원", "1,200원"])),
        )
        .mount(&server)
        .await;

    let result = retail_client(&server.uri())
        .validate_option_prices("77", "10", 1200.0)
        .await
        .expect("difference should be flagged");

    assert!(result.has_price_difference);
    assert_eq!(result.lowest_price, 1000.0);
    assert_eq!(result.api_observed_price, 1200.0);
    assert_eq!(result.options.len(), 2);
}

#[tokio::test]
async fn price_validation_degrades_silently_on_http_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(QUANTITY_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = retail_client(&server.uri())
        .validate_option_prices("77", "10", 1200.0)
        .await;
    assert!(result.is_none());
}

#[tokio::test]
async fn price_validation_degrades_silently_on_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(QUANTITY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>edge cache</html>"))
        .mount(&server)
        .await;

    let result = retail_client(&server.uri())
        .validate_option_prices("77", "10", 1200.0)
        .await;
    assert!(result.is_none());
}
