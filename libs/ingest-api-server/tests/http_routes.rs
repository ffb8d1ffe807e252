use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt;

use ingest_api_server::router;
use ingest_engine::Ingestor;
use publisher_memory::MemoryPublisher;

const BOUNDARY: &str = "XgatewayBoundaryX";

fn app(publisher: &Arc<MemoryPublisher>, body_limit: usize) -> Router {
    let ingestor = Ingestor::new(publisher.clone(), "uploads");
    router(Arc::new(ingestor), body_limit)
}

fn multipart_body(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, content) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{name}.jsonl\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(parts: &[(&str, &str)]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn rest_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/rest")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, String) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn upload_writes_every_line() {
    let publisher = Arc::new(MemoryPublisher::new());
    let req = upload_request(&[("jsonlines", "{\"a\":1}\n{\"a\":2}\n{\"a\":3}\n")]);

    let (status, body) = send(app(&publisher, 0), req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "3 records written");
    let got = publisher.published().await;
    assert_eq!(got.len(), 3);
    assert!(got.iter().all(|p| p.topic == "uploads"));
    assert_eq!(got[1].record.as_bytes(), b"{\"a\":2}");
}

#[tokio::test]
async fn upload_of_empty_file() {
    let publisher = Arc::new(MemoryPublisher::new());
    let (status, body) = send(app(&publisher, 0), upload_request(&[("jsonlines", "")])).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "0 records written");
    assert_eq!(publisher.attempts(), 0);
}

#[tokio::test]
async fn upload_skips_unrelated_fields() {
    let publisher = Arc::new(MemoryPublisher::new());
    let req = upload_request(&[("comment", "not records\n"), ("jsonlines", "1\n2")]);

    let (status, body) = send(app(&publisher, 0), req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "2 records written");
}

#[tokio::test]
async fn upload_aborts_on_broker_rejection() {
    let publisher = Arc::new(MemoryPublisher::failing_on([2]));
    let req = upload_request(&[("jsonlines", "l1\nl2\nl3\n")]);

    let (status, body) = send(app(&publisher, 0), req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("rejected attempt 2"), "{body}");
    assert_eq!(publisher.attempts(), 2);
    assert_eq!(publisher.published().await.len(), 1);
}

#[tokio::test]
async fn upload_without_jsonlines_field() {
    let publisher = Arc::new(MemoryPublisher::new());
    let req = upload_request(&[("other", "1\n")]);

    let (status, body) = send(app(&publisher, 0), req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "missing multipart field 'jsonlines'");
    assert_eq!(publisher.attempts(), 0);
}

#[tokio::test]
async fn rest_publishes_canonical_records() {
    let publisher = Arc::new(MemoryPublisher::new());
    let req = rest_request(r#"{"topic":"t","lines":[{"a": 1},{ "b":2 }]}"#);

    let (status, body) = send(app(&publisher, 0), req).await;

    assert_eq!(status, StatusCode::OK);
    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["records"], 2);

    let got = publisher.published().await;
    assert_eq!(publisher.attempts(), 2);
    assert_eq!(got[0].topic, "t");
    assert_eq!(got[0].record.as_bytes(), br#"{"a":1}"#);
    assert_eq!(got[1].record.as_bytes(), br#"{"b":2}"#);
}

#[tokio::test]
async fn rest_with_empty_lines() {
    let publisher = Arc::new(MemoryPublisher::new());
    let (status, body) = send(app(&publisher, 0), rest_request(r#"{"topic":"t","lines":[]}"#)).await;

    assert_eq!(status, StatusCode::OK);
    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v, serde_json::json!({"records": 0}));
    assert_eq!(publisher.attempts(), 0);
}

#[tokio::test]
async fn rest_rejects_malformed_body() {
    let publisher = Arc::new(MemoryPublisher::new());
    let (status, body) = send(app(&publisher, 0), rest_request(r#"{"topic": "t", "lines": [1, }"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!body.is_empty());
    assert_eq!(publisher.attempts(), 0);
}

#[tokio::test]
async fn rest_reports_broker_rejection() {
    let publisher = Arc::new(MemoryPublisher::failing_on([2]));
    let (status, body) = send(app(&publisher, 0), rest_request(r#"{"topic":"t","lines":[1,2,3]}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("rejected attempt 2"), "{body}");
    assert_eq!(publisher.attempts(), 2);
}

#[tokio::test]
async fn rest_body_limit() {
    let publisher = Arc::new(MemoryPublisher::new());
    let big = format!(r#"{{"topic":"t","lines":["{}"]}}"#, "x".repeat(256));

    let (status, _) = send(app(&publisher, 64), rest_request(&big)).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(publisher.attempts(), 0);
}

#[tokio::test]
async fn upload_is_not_capped_by_body_limit() {
    let publisher = Arc::new(MemoryPublisher::new());
    let line = format!("{{\"payload\":\"{}\"}}\n", "x".repeat(20));
    let content = line.repeat(100_000);
    assert!(content.len() > 2 << 20);

    let req = upload_request(&[("jsonlines", content.as_str())]);
    let (status, body) = send(app(&publisher, 4096), req).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body, "100000 records written");
    assert_eq!(publisher.attempts(), 100_000);
}

#[tokio::test]
async fn form_and_healthz() {
    let publisher = Arc::new(MemoryPublisher::new());

    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(app(&publisher, 0), req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"name="jsonlines""#));

    let req = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let (status, body) = send(app(&publisher, 0), req).await;
    assert_eq!(status, StatusCode::OK);
    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["status"], "ok");
}
