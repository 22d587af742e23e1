use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::Engine as _;
use http_body_util::BodyExt;
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, Statement};
use serde_json::{Value, json};
use server::ServerState;
use tower::ServiceExt;

async fn app() -> Router {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    for username in ["alice", "bob"] {
        db.execute(Statement::from_sql_and_values(
            db.get_database_backend(),
            "INSERT INTO users (username, password) VALUES (?, ?)",
            vec![username.into(), "secret".into()],
        ))
        .await
        .unwrap();
    }

    let engine = engine::Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    server::router(
        ServerState {
            engine: Arc::new(engine),
            db,
        },
        None,
    )
    .unwrap()
}

fn basic(user: &str) -> String {
    let secret = format!("{user}:secret");
    format!("Basic {}", base64::prelude::BASE64_STANDARD.encode(secret))
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    user: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, basic(user));
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create_sheet(app: &Router, claim_number: &str) -> String {
    let (status, body) = call(
        app,
        "POST",
        "/api/claim-sheets",
        "alice",
        Some(json!({
            "name": "Conference trip",
            "claim_number": claim_number,
            "claim_type": "Travel",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

async fn create_expense(app: &Router, sheet_id: &str, bill_no: &str, amount: &str) -> Value {
    let (status, body) = call(
        app,
        "POST",
        "/api/expenses",
        "alice",
        Some(json!({
            "claim_sheet_id": sheet_id,
            "bill_no": bill_no,
            "date": "2024-05-17",
            "issued_by": "Blue Cabs",
            "details": "Taxi",
            "amount": amount,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

fn expense_ids(body: &Value) -> Vec<String> {
    body["expenses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|expense| expense["id"].as_str().unwrap().to_string())
        .collect()
}

fn expense_serials(body: &Value) -> Vec<i64> {
    body["expenses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|expense| expense["serial_no"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn health_needs_no_credentials() {
    let app = app().await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_or_wrong_credentials_are_unauthorized() {
    let app = app().await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/claim-sheets")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let wrong = format!(
        "Basic {}",
        base64::prelude::BASE64_STANDARD.encode("alice:nope")
    );
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/claim-sheets")
                .header(header::AUTHORIZATION, wrong)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn reorder_over_http_returns_new_order() {
    let app = app().await;
    let sheet_id = create_sheet(&app, "CLM-1").await;
    let a = create_expense(&app, &sheet_id, "A", "10.00").await;
    let b = create_expense(&app, &sheet_id, "B", "20,50").await;
    let c = create_expense(&app, &sheet_id, "C", "5").await;
    assert_eq!(b["amount_minor"], 2050);

    let order = vec![
        c["id"].as_str().unwrap().to_string(),
        a["id"].as_str().unwrap().to_string(),
        b["id"].as_str().unwrap().to_string(),
    ];
    let (status, body) = call(
        &app,
        "PUT",
        &format!("/api/expenses/reorder/{sheet_id}"),
        "alice",
        Some(json!({ "expense_ids": order })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(expense_ids(&body), order);
    assert_eq!(expense_serials(&body), vec![1, 2, 3]);

    let (status, body) = call(
        &app,
        "GET",
        &format!("/api/expenses/claim-sheet/{sheet_id}"),
        "alice",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(expense_ids(&body), order);

    let (_, sheet) = call(&app, "GET", &format!("/api/claim-sheets/{sheet_id}"), "alice", None).await;
    assert_eq!(sheet["total_amount"], "35.50");
}

#[tokio::test]
async fn reorder_errors_map_to_status_codes() {
    let app = app().await;
    let sheet_id = create_sheet(&app, "CLM-1").await;
    let a = create_expense(&app, &sheet_id, "A", "10").await;
    let b = create_expense(&app, &sheet_id, "B", "20").await;
    let a_id = a["id"].as_str().unwrap().to_string();
    let b_id = b["id"].as_str().unwrap().to_string();
    let uri = format!("/api/expenses/reorder/{sheet_id}");

    let (status, body) = call(&app, "PUT", &uri, "alice", Some(json!({ "expense_ids": [] }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());

    let (status, _) = call(&app, "PUT", &uri, "alice", Some(json!({ "expense_ids": [a_id] }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let stranger = uuid::Uuid::new_v4().to_string();
    let (status, _) = call(
        &app,
        "PUT",
        &uri,
        "alice",
        Some(json!({ "expense_ids": [a_id, b_id, stranger] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &app,
        "PUT",
        &uri,
        "bob",
        Some(json!({ "expense_ids": [b_id, a_id] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, sheet) = call(&app, "GET", &format!("/api/claim-sheets/{sheet_id}"), "alice", None).await;
    let revision = sheet["revision"].as_i64().unwrap();
    let (status, _) = call(
        &app,
        "PUT",
        &uri,
        "alice",
        Some(json!({ "expense_ids": [b_id, a_id], "expected_revision": revision - 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &app,
        "PUT",
        &uri,
        "alice",
        Some(json!({ "expense_ids": [b_id, a_id], "expected_revision": revision })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn invalid_amount_is_unprocessable() {
    let app = app().await;
    let sheet_id = create_sheet(&app, "CLM-1").await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/expenses",
        "alice",
        Some(json!({
            "claim_sheet_id": sheet_id,
            "bill_no": "A",
            "date": "2024-05-17",
            "issued_by": "Blue Cabs",
            "details": "Taxi",
            "amount": "0",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("amount"));

    for amount in ["1000000000.01", "46116860184273879.04"] {
        let (status, body) = call(
            &app,
            "POST",
            "/api/expenses",
            "alice",
            Some(json!({
                "claim_sheet_id": sheet_id,
                "bill_no": "B",
                "date": "2024-05-17",
                "issued_by": "Blue Cabs",
                "details": "Taxi",
                "amount": amount,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{amount}: {body}");
    }
}

#[tokio::test]
async fn duplicate_claim_number_conflicts() {
    let app = app().await;
    create_sheet(&app, "CLM-1").await;

    let (status, _) = call(
        &app,
        "POST",
        "/api/claim-sheets",
        "bob",
        Some(json!({ "name": "Other", "claim_number": "CLM-1", "claim_type": "Travel" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn batch_create_and_delete_expense() {
    let app = app().await;
    let sheet_id = create_sheet(&app, "CLM-1").await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/expenses/batch",
        "alice",
        Some(json!({
            "claim_sheet_id": sheet_id,
            "expenses": [
                { "bill_no": "A", "date": "2024-05-17", "issued_by": "Cafe", "details": "Lunch", "amount": "12.00" },
                { "bill_no": "B", "date": "2024-05-18", "issued_by": "Cafe", "details": "Dinner", "amount": "30.00" },
            ],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(expense_serials(&body), vec![1, 2]);
    let first = expense_ids(&body)[0].clone();

    let (status, _) = call(&app, "DELETE", &format!("/api/expenses/{first}"), "alice", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&app, "GET", &format!("/api/expenses/{first}"), "alice", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, sheet) = call(&app, "GET", &format!("/api/claim-sheets/{sheet_id}"), "alice", None).await;
    assert_eq!(sheet["total_amount_minor"], 3000);
}

#[tokio::test]
async fn update_claim_sheet_status() {
    let app = app().await;
    let sheet_id = create_sheet(&app, "CLM-1").await;

    let (status, body) = call(
        &app,
        "PUT",
        &format!("/api/claim-sheets/{sheet_id}"),
        "alice",
        Some(json!({ "status": "Submitted" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Submitted");

    let (status, _) = call(
        &app,
        "PUT",
        &format!("/api/claim-sheets/{sheet_id}"),
        "alice",
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn export_returns_csv() {
    let app = app().await;
    let sheet_id = create_sheet(&app, "CLM-1").await;
    create_expense(&app, &sheet_id, "A", "10").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/claim-sheets/{sheet_id}/export"))
                .header(header::AUTHORIZATION, basic("alice"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "S.No.,Bill No.,Date,Issued By,Details,Amount",
            "1,A,17/05/24,Blue Cabs,Taxi,10.00",
            ",,,,Total,10.00",
        ]
    );
}

#[tokio::test]
async fn spawned_server_answers_on_its_listener() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = engine::Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = server::spawn_with_listener(engine, db, listener, None).unwrap();

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /api/health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.contains(r#"{"status":"ok"}"#));
}
