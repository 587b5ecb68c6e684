use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Days, Utc};
use docket_tracker::api::rest::router;
use docket_tracker::state::AppState;
use serde_json::{json, Value};
use tower::ServiceExt;

fn setup() -> axum::Router {
    let state = AppState::new("DKT".to_string(), 1000, 64);
    router(Arc::new(state))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn delete_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn day_offset(days: i64) -> String {
    let today = Utc::now().date_naive();
    let date = if days >= 0 {
        today.checked_add_days(Days::new(days as u64)).unwrap()
    } else {
        today.checked_sub_days(Days::new((-days) as u64)).unwrap()
    };
    date.to_string()
}

fn create_payload(booking_offset: i64, expected_offset: i64) -> Value {
    json!({
        "consignor": { "new": {
            "name": "Apex Textiles",
            "address": "14 MG Road, Mumbai",
            "gstin": "27AAPFU0939F1ZV"
        }},
        "consignee": { "new": {
            "name": "Northline Traders",
            "address": "3 Karol Bagh, Delhi",
            "gstin": null,
            "temporary": true
        }},
        "origin": "Mumbai",
        "destination": "Delhi",
        "booking_date": day_offset(booking_offset),
        "expected_delivery": day_offset(expected_offset),
        "mode": "Surface",
        "billed_to": "Consignor",
        "load_type": "FullLoad",
        "invoice": {
            "invoice_no": "INV-2025-044",
            "declared_value": 184000.0,
            "eway_bill_no": "EWB123456789012"
        }
    })
}

async fn create_shipment(app: &axum::Router, payload: Value) -> Value {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/shipments", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

#[tokio::test]
async fn health_returns_ok() {
    let app = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["shipments"], 0);
    assert_eq!(body["activities"], 0);
    assert_eq!(body["co_loaders"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let app = setup();
    create_shipment(&app, create_payload(0, 7)).await;

    let response = app.oneshot(get_request("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("active_shipments"));
    assert!(body.contains("shipments_created_total"));
}

#[tokio::test]
async fn create_shipment_assembles_the_aggregate() {
    let app = setup();
    let body = create_shipment(&app, create_payload(0, 7)).await;

    assert_eq!(body["shipment"]["docket_no"]["prefix"], "DKT");
    assert_eq!(body["shipment"]["docket_no"]["number"], 1001);
    assert_eq!(body["shipment"]["status"], "Active");
    assert_eq!(body["shipment"]["cancellation"], Value::Null);
    assert!(body["shipment"]["distance_km"].as_f64().unwrap() > 1000.0);

    assert_eq!(body["booking"]["mode"], "Surface");
    assert_eq!(body["consignor"]["name"], "Apex Textiles");
    assert_eq!(body["consignee"]["temporary"], true);

    assert_eq!(body["invoice"]["invoice_no"], "INV-2025-044");
    assert_eq!(body["invoice"]["eway_bill"]["number"], "EWB123456789012");
    assert!(body["invoice"]["eway_bill"]["expiry"].is_string());

    assert_eq!(body["activities"].as_array().unwrap().len(), 1);
    assert_eq!(body["activities"][0]["code"], "Booked");
    assert_eq!(body["activities"][0]["location"], "Mumbai");
    assert_eq!(body["has_co_loader"], false);
}

#[tokio::test]
async fn sequential_creates_get_distinct_docket_numbers() {
    let app = setup();

    let first = create_shipment(&app, create_payload(0, 7)).await;
    let second = create_shipment(&app, create_payload(0, 7)).await;

    assert_eq!(first["shipment"]["docket_no"]["number"], 1001);
    assert_eq!(second["shipment"]["docket_no"]["number"], 1002);
}

#[tokio::test]
async fn unknown_party_reference_leaves_no_partial_records() {
    let app = setup();

    let mut payload = create_payload(0, 7);
    payload["consignee"] = json!({ "existing": { "id": "7f2a1f0e-54c6-4c6e-9d4b-2f8f0a8d9c11" } });

    let response = app
        .clone()
        .oneshot(json_request("POST", "/shipments", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let health = body_json(app.oneshot(get_request("/health")).await.unwrap()).await;
    assert_eq!(health["shipments"], 0);
    assert_eq!(health["activities"], 0);
}

#[tokio::test]
async fn create_with_blank_origin_returns_400() {
    let app = setup();

    let mut payload = create_payload(0, 7);
    payload["origin"] = json!("  ");

    let response = app
        .oneshot(json_request("POST", "/shipments", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn latest_activity_drives_current_status() {
    let app = setup();
    let created = create_shipment(&app, create_payload(0, 7)).await;
    let shipment_id = created["shipment"]["id"].as_str().unwrap().to_string();

    let detail = body_json(
        app.clone()
            .oneshot(get_request(&format!("/shipments/{shipment_id}")))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(detail["current_code"], "Booked");
    assert_eq!(detail["delivery_state"], "pending");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{shipment_id}/activities"),
            json!({
                "code": "Delivered",
                "location": "Delhi",
                "date": day_offset(1),
                "time": "14:30:00"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let detail = body_json(
        app.oneshot(get_request(&format!("/shipments/{shipment_id}")))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(detail["current_code"], "Delivered");
    assert_eq!(detail["delivery_state"], "delivered");
}

#[tokio::test]
async fn activities_list_newest_first_and_delete_removes() {
    let app = setup();
    let created = create_shipment(&app, create_payload(0, 7)).await;
    let shipment_id = created["shipment"]["id"].as_str().unwrap().to_string();

    for (code, location, offset) in [("InTransit", "Nagpur", 1), ("OutForDelivery", "Delhi", 2)] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/shipments/{shipment_id}/activities"),
                json!({
                    "code": code,
                    "location": location,
                    "date": day_offset(offset),
                    "time": "09:00:00"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let listed = body_json(
        app.clone()
            .oneshot(get_request(&format!("/shipments/{shipment_id}/activities")))
            .await
            .unwrap(),
    )
    .await;
    let listed = listed.as_array().unwrap().clone();
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0]["code"], "OutForDelivery");
    assert_eq!(listed[2]["code"], "Booked");

    let newest_id = listed[0]["id"].as_str().unwrap();
    let response = app
        .clone()
        .oneshot(delete_request(&format!("/activities/{newest_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let listed = body_json(
        app.oneshot(get_request(&format!("/shipments/{shipment_id}/activities")))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(listed.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn cancel_and_restore_walk_the_lifecycle() {
    let app = setup();
    let created = create_shipment(&app, create_payload(0, 7)).await;
    let shipment_id = created["shipment"]["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{shipment_id}/cancel"),
            json!({ "reason": "booked in error", "actor_id": "ops-17" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cancelled = body_json(response).await;
    assert_eq!(cancelled["status"], "Cancelled");
    assert_eq!(cancelled["cancellation"]["reason"], "booked in error");
    assert_eq!(cancelled["cancellation"]["cancelled_by"], "ops-17");

    // Cancelled shipments disappear from listings but stay addressable.
    let listed = body_json(app.clone().oneshot(get_request("/shipments")).await.unwrap()).await;
    assert_eq!(listed.as_array().unwrap().len(), 0);
    let detail = app
        .clone()
        .oneshot(get_request(&format!("/shipments/{shipment_id}")))
        .await
        .unwrap();
    assert_eq!(detail.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{shipment_id}/cancel"),
            json!({ "reason": "again", "actor_id": "ops-18" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{shipment_id}/restore"),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let restored = body_json(response).await;
    assert_eq!(restored["status"], "Active");
    assert_eq!(restored["cancellation"], Value::Null);

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{shipment_id}/restore"),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn cancel_with_blank_reason_returns_400() {
    let app = setup();
    let created = create_shipment(&app, create_payload(0, 7)).await;
    let shipment_id = created["shipment"]["id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{shipment_id}/cancel"),
            json!({ "reason": "   ", "actor_id": "ops-17" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn co_loader_link_is_one_to_one() {
    let app = setup();
    let created = create_shipment(&app, create_payload(0, 7)).await;
    let shipment_id = created["shipment"]["id"].as_str().unwrap().to_string();

    let available = body_json(
        app.clone()
            .oneshot(get_request("/co-loaders/available"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(available.as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{shipment_id}/co-loader"),
            json!({
                "carrier_name": "Sharma Roadways",
                "carrier_docket_no": "SR-4417",
                "actor_id": "ops-17"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let linked = body_json(response).await;
    let co_loader_id = linked["id"].as_str().unwrap().to_string();
    assert_eq!(linked["carrier_name"], "Sharma Roadways");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{shipment_id}/co-loader"),
            json!({
                "carrier_name": "Other Carrier",
                "carrier_docket_no": "OC-1",
                "actor_id": "ops-18"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let detail = body_json(
        app.clone()
            .oneshot(get_request(&format!("/shipments/{shipment_id}")))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(detail["has_co_loader"], true);

    let available = body_json(
        app.clone()
            .oneshot(get_request("/co-loaders/available"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(available.as_array().unwrap().len(), 0);

    let response = app
        .clone()
        .oneshot(delete_request(&format!("/co-loaders/{co_loader_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let detail = body_json(
        app.oneshot(get_request(&format!("/shipments/{shipment_id}")))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(detail["has_co_loader"], false);
}

#[tokio::test]
async fn available_listing_excludes_cancelled_shipments() {
    let app = setup();
    let created = create_shipment(&app, create_payload(0, 7)).await;
    let shipment_id = created["shipment"]["id"].as_str().unwrap().to_string();

    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{shipment_id}/cancel"),
            json!({ "reason": "consignor withdrew", "actor_id": "ops-17" }),
        ))
        .await
        .unwrap();

    let available = body_json(
        app.oneshot(get_request("/co-loaders/available"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(available.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn eway_bill_can_be_extended_and_cleared() {
    let app = setup();
    let created = create_shipment(&app, create_payload(0, 7)).await;
    let invoice_id = created["invoice"]["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/invoices/{invoice_id}/eway-bill"),
            json!({ "expiry": "2031-01-15" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["eway_bill"]["expiry"], "2031-01-15");

    let response = app
        .clone()
        .oneshot(delete_request(&format!("/invoices/{invoice_id}/eway-bill")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = body_json(response).await;
    assert_eq!(cleared["eway_bill"], Value::Null);

    // Nothing left to extend once the bill is cleared.
    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/invoices/{invoice_id}/eway-bill"),
            json!({ "expiry": "2031-02-01" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn expiring_listing_tracks_stale_bills_until_cancellation() {
    let app = setup();

    // Booked a month ago, so the computed e-way validity window has lapsed.
    let created = create_shipment(&app, create_payload(-30, -20)).await;
    let shipment_id = created["shipment"]["id"].as_str().unwrap().to_string();

    let expiring = body_json(
        app.clone()
            .oneshot(get_request("/eway-bills/expiring"))
            .await
            .unwrap(),
    )
    .await;
    let expiring = expiring.as_array().unwrap().clone();
    assert_eq!(expiring.len(), 1);
    assert_eq!(expiring[0]["health"]["state"], "expired");
    assert!(expiring[0]["health"]["days"].as_i64().unwrap() > 0);

    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/shipments/{shipment_id}/cancel"),
            json!({ "reason": "stale booking", "actor_id": "ops-17" }),
        ))
        .await
        .unwrap();

    let expiring = body_json(
        app.oneshot(get_request("/eway-bills/expiring"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(expiring.as_array().unwrap().len(), 0);
}
