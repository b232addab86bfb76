mod common;

use common::{dt, id};
use secrecy::Secret;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use shipment_board::config::BackendSettings;
use shipment_board::errors::BoardError;
use shipment_board::models::{ShipmentStatus, ShipmentId};
use shipment_board::services::backend::{endpoint, parse_shipments};
use url::Url;
use shipment_board::services::{HttpShipmentBackend, RescheduleRequest, ShipmentBackend};

fn settings(base_url: String) -> BackendSettings {
    BackendSettings {
        base_url,
        shipments_path: "/api/shipment/getAll".to_string(),
        reschedule_path: "/api/shipment/update-delivery-date".to_string(),
        api_token: None,
        request_timeout_ms: Some(2_000),
    }
}

fn wire_shipments() -> Value {
    json!([
        {
            "_id": "s1",
            "tracking_number": "1Z999",
            "shortId": "SH-1",
            "delivery_date": "2024-03-10T14:32:07",
            "status": "Received",
            "missed_delivery": true,
            "courier": "UPS",
            "supplier": { "_id": "sup-1", "name": "Acme" },
            "location": "loc-9",
            "items": [{ "name": "Bolts", "sku": "B-1", "quantity": 40 }, { "name": "Nuts" }]
        },
        {
            "id": "s2",
            "delivery_date": null,
            "actual_delivery_date": "",
            "status": "In Transit"
        }
    ])
}

#[tokio::test]
async fn test_fetch_decodes_bare_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/shipment/getAll"))
        .respond_with(ResponseTemplate::new(200).set_body_json(wire_shipments()))
        .mount(&server)
        .await;

    let backend = HttpShipmentBackend::new(&settings(server.uri())).unwrap();
    let shipments = backend.fetch_shipments().await.unwrap();

    assert_eq!(shipments.len(), 2);
    let s1 = &shipments[0];
    assert_eq!(s1.id, id("s1"));
    assert_eq!(s1.delivery_date, Some(dt("2024-03-10T14:32:07")));
    assert_eq!(s1.status, ShipmentStatus::Received);
    assert!(s1.missed_delivery);
    assert_eq!(s1.supplier_name(), "Acme");
    assert_eq!(s1.location.as_ref().and_then(|l| l.id.as_deref()), Some("loc-9"));
    assert_eq!(s1.total_quantity(), 40.0);
    assert_eq!(s1.label(), "1Z999");

    let s2 = &shipments[1];
    assert_eq!(s2.id, ShipmentId::from("s2"));
    assert_eq!(s2.delivery_date, None);
    assert_eq!(s2.actual_delivery_date, None);
    assert_eq!(s2.status, ShipmentStatus::Other("In Transit".to_string()));
    assert_eq!(s2.courier_name(), "Unknown");
}

#[tokio::test]
async fn test_fetch_accepts_wrapped_collections() {
    for key in ["shipments", "data"] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/shipment/getAll"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ key: wire_shipments() })))
            .mount(&server)
            .await;

        let backend = HttpShipmentBackend::new(&settings(server.uri())).unwrap();
        assert_eq!(backend.fetch_shipments().await.unwrap().len(), 2, "wrapped in {}", key);
    }
}

#[tokio::test]
async fn test_fetch_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/shipment/getAll"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = settings(server.uri());
    config.api_token = Some(Secret::new("s3cret".to_string()));
    let backend = HttpShipmentBackend::new(&config).unwrap();

    assert!(backend.fetch_shipments().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reschedule_posts_id_and_timestamp() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/shipment/update-delivery-date"))
        .and(body_partial_json(json!({ "id": "s1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpShipmentBackend::new(&settings(server.uri())).unwrap();
    let request = RescheduleRequest {
        id: id("s1"),
        delivery_date: "2024-03-15T14:32:07+00:00".to_string(),
    };
    backend.update_delivery_date(&request).await.unwrap();

    let received = server.received_requests().await.unwrap();
    let body: Value = received[0].body_json().unwrap();
    assert_eq!(body["delivery_date"], "2024-03-15T14:32:07+00:00");
}

#[tokio::test]
async fn test_rejection_surfaces_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/shipment/update-delivery-date"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "Database unavailable" })))
        .mount(&server)
        .await;

    let backend = HttpShipmentBackend::new(&settings(server.uri())).unwrap();
    let request = RescheduleRequest { id: id("s1"), delivery_date: "2024-03-15T14:32:07+00:00".to_string() };
    let err = backend.update_delivery_date(&request).await.unwrap_err();

    assert!(err.is_remote());
    assert!(matches!(
        err,
        BoardError::ServerRejected { status: 500, ref message } if message == "Database unavailable"
    ));
}

#[tokio::test]
async fn test_rejection_without_message_uses_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let backend = HttpShipmentBackend::new(&settings(server.uri())).unwrap();
    let request = RescheduleRequest { id: id("s1"), delivery_date: "2024-03-15T14:32:07+00:00".to_string() };
    let err = backend.update_delivery_date(&request).await.unwrap_err();

    assert!(matches!(
        err,
        BoardError::ServerRejected { status: 502, ref message } if message == "Server error 502"
    ));
}

#[tokio::test]
async fn test_garbled_success_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let backend = HttpShipmentBackend::new(&settings(server.uri())).unwrap();
    let request = RescheduleRequest { id: id("s1"), delivery_date: "2024-03-15T14:32:07+00:00".to_string() };
    let err = backend.update_delivery_date(&request).await.unwrap_err();

    assert!(matches!(err, BoardError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_unreachable_server_is_a_transport_error() {
    let backend = HttpShipmentBackend::new(&settings("http://127.0.0.1:9".to_string())).unwrap();
    let err = backend.fetch_shipments().await.unwrap_err();
    assert!(matches!(err, BoardError::TransportError(_)));
}

#[test]
fn test_parse_shipments_shapes() {
    assert_eq!(parse_shipments(r#"{"total": 0}"#).unwrap().len(), 0);
    assert!(matches!(parse_shipments("42"), Err(BoardError::MalformedResponse(_))));
    assert!(matches!(parse_shipments("[{\"status\": \"Received\"}]"), Err(BoardError::MalformedResponse(_))));
}

#[test]
fn test_fractional_and_textual_quantities_are_summed() {
    let shipments = parse_shipments(r#"[
        {"_id": "a", "delivery_date": "2024-03-10T09:00:00", "items": [
            {"name": "Cable", "quantity": 2.5, "uom": "FT"},
            {"name": "Conduit", "quantity": "4"},
            {"name": "Tape", "quantity": "n/a"},
            {"name": "Wire", "quantity": null}
        ]},
        {"_id": "b", "delivery_date": "2024-03-11T08:00:00", "items": [{"quantity": 3}]}
    ]"#).unwrap();

    assert_eq!(shipments.len(), 2);
    assert_eq!(shipments[0].items[0].uom.as_deref(), Some("FT"));
    assert_eq!(shipments[0].items[2].quantity, None);
    assert_eq!(shipments[0].total_quantity(), 6.5);
    assert_eq!(shipments[1].total_quantity(), 3.0);
}

#[test]
fn test_unreadable_delivery_date_leaves_record_unscheduled() {
    let shipments = parse_shipments(r#"[
        {"_id": "a", "delivery_date": "not a date"},
        {"_id": "b", "delivery_date": "2024-03-11T08:00:00"}
    ]"#).unwrap();

    assert_eq!(shipments.len(), 2);
    assert_eq!(shipments[0].id, id("a"));
    assert_eq!(shipments[0].delivery_date, None);
    assert_eq!(shipments[1].delivery_date, Some(dt("2024-03-11T08:00:00")));
}

#[test]
fn test_endpoint_keeps_base_path_prefix() {
    let prefixed = Url::parse("https://host.example/dash").unwrap();
    assert_eq!(
        endpoint(&prefixed, "/api/shipment/getAll").unwrap().as_str(),
        "https://host.example/dash/api/shipment/getAll"
    );
    let origin = Url::parse("https://host.example").unwrap();
    assert_eq!(
        endpoint(&origin, "/api/shipment/getAll").unwrap().as_str(),
        "https://host.example/api/shipment/getAll"
    );
}

#[tokio::test]
async fn test_fetch_under_base_path_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dash/api/shipment/getAll"))
        .respond_with(ResponseTemplate::new(200).set_body_json(wire_shipments()))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpShipmentBackend::new(&settings(format!("{}/dash/", server.uri()))).unwrap();
    assert_eq!(backend.fetch_shipments().await.unwrap().len(), 2);
}

#[test]
fn test_invalid_base_url_is_rejected() {
    assert!(matches!(HttpShipmentBackend::new(&settings("not a url".to_string())), Err(BoardError::UrlError(_))));
}
