use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use fake::{
    faker::{name::en::Name, phone_number::en::PhoneNumber},
    Fake,
};
use raffle_tickets::{
    app, config::Config, realtime::TicketEvent, store::MemoryTicketStore, AppState,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const ACCESS_CODE: &str = "rifa-2024";

fn config(extra: &[(&str, &str)]) -> Config {
    let mut pairs = vec![("ACCESS_CODE", ACCESS_CODE)];
    pairs.extend_from_slice(extra);
    let pairs: Vec<(String, String)> = pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(move |key| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
    .unwrap()
}

fn test_app(extra: &[(&str, &str)]) -> (Router, Arc<AppState>) {
    let state = AppState::with_store(config(extra), Arc::new(MemoryTicketStore::new()));
    (app(state.clone()).unwrap(), state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn list(app: &Router) -> Vec<Value> {
    let (status, body) = send(app, get("/boletas")).await;
    assert_eq!(status, StatusCode::OK);
    body.as_array().cloned().unwrap()
}

#[tokio::test]
async fn sold_ticket_scenario() {
    let (app, _) = test_app(&[]);

    let (status, body) = send(
        &app,
        post_json(
            "/boletas",
            json!({"number": "007", "clientName": "Ana", "paymentStatus": "Paid", "amountPaid": 50000}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let tickets = list(&app).await;
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0]["number"], "007");
    assert_eq!(tickets[0]["clientName"], "Ana");
    assert_eq!(tickets[0]["amountPaid"], 50000.0);

    let (status, body) = send(
        &app,
        post_json(
            "/boletas",
            json!({"number": "007", "clientName": "Luis", "paymentStatus": "Pending"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("already sold"));

    let tickets = list(&app).await;
    assert_eq!(tickets[0]["clientName"], "Ana");
    assert_eq!(tickets[0]["paymentStatus"], "Paid");

    let (status, body) = send(&app, delete("/boletas/007")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));
    assert!(list(&app).await.is_empty());
}

#[tokio::test]
async fn missing_number_is_a_bad_request() {
    let (app, _) = test_app(&[]);

    let (status, body) = send(&app, post_json("/boletas", json!({"clientName": "Ana"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, post_json("/boletas", json!({"number": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(list(&app).await.is_empty());
}

#[tokio::test]
async fn malformed_json_is_reported_as_json() {
    let (app, _) = test_app(&[]);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/boletas")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"number\": "))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn front_end_payload_with_integer_number_is_accepted() {
    let (app, _) = test_app(&[]);

    let (status, _) = send(
        &app,
        post_json(
            "/boletas",
            json!({"numero": 12, "cliente": "Marta", "celular": "3110000000", "pago": "Pendiente", "montoAbono": 10000, "vendedor": "Pedro"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let tickets = list(&app).await;
    assert_eq!(tickets[0]["number"], "12");
    assert_eq!(tickets[0]["seller"], "Pedro");
}

#[tokio::test]
async fn list_returns_every_field_as_last_written() {
    let (app, _) = test_app(&[]);
    let name: String = Name().fake();
    let phone: String = PhoneNumber().fake();

    send(&app, post_json("/boletas", json!({"number": "1", "clientName": "Old"}))).await;
    send(&app, post_json("/boletas", json!({"number": "2"}))).await;
    send(
        &app,
        post_json(
            "/boletas",
            json!({"number": "1", "clientName": name, "phone": phone, "paymentStatus": "Pending", "amountPaid": 15000.5, "seller": "Pedro"}),
        ),
    )
    .await;

    let tickets = list(&app).await;
    assert_eq!(tickets.len(), 2);
    assert_eq!(
        tickets[0],
        json!({
            "number": "1",
            "clientName": name,
            "phone": phone,
            "paymentStatus": "Pending",
            "amountPaid": 15000.5,
            "seller": "Pedro"
        })
    );
    assert_eq!(tickets[1]["number"], "2");
    assert!(tickets[1]["clientName"].is_null());
}

#[tokio::test]
async fn delete_is_idempotent_and_targets_one_row() {
    let (app, _) = test_app(&[]);
    for n in ["1", "2", "3"] {
        send(&app, post_json("/boletas", json!({"number": n}))).await;
    }

    let (status, body) = send(&app, delete("/boletas/404")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    send(&app, delete("/boletas/2")).await;
    let numbers: Vec<Value> = list(&app).await.into_iter().map(|t| t["number"].clone()).collect();
    assert_eq!(numbers, vec![json!("1"), json!("3")]);
}

#[tokio::test]
async fn verify_code_endpoint() {
    let (app, _) = test_app(&[]);

    let (status, body) = send(&app, post_json("/verify-code", json!({"code": " rifa-2024 "}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"valid": true}));

    let (status, body) = send(&app, post_json("/verify-code", json!({"code": "1234"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["valid"], false);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, post_json("/verify-code", json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["valid"], false);
}

#[tokio::test]
async fn mutations_are_broadcast() {
    let (app, state) = test_app(&[]);
    let mut events = state.broadcaster.as_ref().unwrap().subscribe();

    send(&app, post_json("/boletas", json!({"number": "9", "clientName": "Ana"}))).await;
    send(&app, delete("/boletas/9")).await;

    match events.recv().await.unwrap() {
        TicketEvent::TicketUpdated(ticket) => {
            assert_eq!(ticket.number, "9");
            assert_eq!(ticket.client_name.as_deref(), Some("Ana"));
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(
        events.recv().await.unwrap(),
        TicketEvent::TicketDeleted { number: "9".into() }
    );
}

#[tokio::test]
async fn realtime_can_be_disabled() {
    let (app, state) = test_app(&[("ENABLE_REALTIME", "false")]);
    assert!(state.broadcaster.is_none());

    let (status, _) = send(&app, get("/ws")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, post_json("/boletas", json!({"number": "1"}))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn websocket_route_is_mounted_with_realtime() {
    let (app, _) = test_app(&[]);

    // a plain GET is not an upgrade, so the extractor rejects it
    let (status, _) = send(&app, get("/ws")).await;
    assert_ne!(status, StatusCode::NOT_FOUND);
    assert!(status.is_client_error());
}

#[tokio::test]
async fn cors_allows_only_configured_origins() {
    let (app, _) = test_app(&[("CORS_ORIGINS", "https://rifa.example.com")]);

    let preflight = |origin: &str| {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/boletas")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap()
    };

    let response = app
        .clone()
        .oneshot(preflight("https://rifa.example.com"))
        .await
        .unwrap();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://rifa.example.com"
    );

    let response = app
        .clone()
        .oneshot(preflight("https://evil.example.com"))
        .await
        .unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn health_check() {
    let (app, _) = test_app(&[]);
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
