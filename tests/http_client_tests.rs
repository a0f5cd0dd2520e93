use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use predrelay::client::{HttpPredictionClient, PredictionClient};
use predrelay::config::{Config, ConfigHolder, ServerConfig, UpstreamConfig};
use predrelay::{create_router, AppState};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tower::util::ServiceExt;

#[derive(Debug, Clone)]
struct Captured {
    content_type: Option<String>,
    authorization: Option<String>,
    body: Vec<u8>,
}

type Captures = Arc<Mutex<Vec<Captured>>>;

async fn score(
    State(captures): State<Captures>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };
    captures.lock().unwrap().push(Captured {
        content_type: header("content-type"),
        authorization: header("authorization"),
        body: body.to_vec(),
    });
    (StatusCode::OK, "[0.25, 0.75]".to_string())
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::SERVICE_UNAVAILABLE, "model not loaded")
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_millis(500)).await;
    "late"
}

/// Starts a fake prediction service and returns its base url.
async fn start_upstream() -> (String, Captures) {
    let captures: Captures = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/score", post(score))
        .route("/broken", post(broken))
        .route("/slow", post(slow))
        .with_state(captures.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), captures)
}

#[tokio::test]
async fn test_post_json_without_token() {
    let (base, captures) = start_upstream().await;
    let client = HttpPredictionClient::new(None).unwrap();

    let reply = client
        .post_json(&format!("{}/score", base), Bytes::from_static(br#"{"data":["1"]}"#), None)
        .await
        .unwrap();
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, "[0.25, 0.75]");

    let captured = captures.lock().unwrap()[0].clone();
    assert_eq!(captured.content_type.as_deref(), Some("application/json"));
    assert_eq!(captured.authorization, None);
    assert_eq!(captured.body, br#"{"data":["1"]}"#.to_vec());
}

#[tokio::test]
async fn test_post_json_with_bearer_token() {
    let (base, captures) = start_upstream().await;
    let client = HttpPredictionClient::new(None).unwrap();

    client
        .post_json(&format!("{}/score", base), Bytes::from_static(b"{}"), Some("k3y"))
        .await
        .unwrap();

    let captured = captures.lock().unwrap()[0].clone();
    assert_eq!(captured.authorization.as_deref(), Some("Bearer k3y"));
    assert_eq!(captured.content_type.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn test_post_json_reports_non_200() {
    let (base, _) = start_upstream().await;
    let client = HttpPredictionClient::new(None).unwrap();

    let reply = client
        .post_json(&format!("{}/broken", base), Bytes::from_static(b"{}"), None)
        .await
        .unwrap();
    assert_eq!(reply.status, 503);
    assert_eq!(reply.body, "model not loaded");
    assert!(!reply.is_ok());
}

#[tokio::test]
async fn test_post_json_connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpPredictionClient::new(None).unwrap();
    let result = client
        .post_json(&format!("http://{}/score", addr), Bytes::from_static(b"{}"), None)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_post_json_honours_configured_timeout() {
    let (base, _) = start_upstream().await;
    let client = HttpPredictionClient::new(Some(Duration::from_millis(50))).unwrap();

    let result = client
        .post_json(&format!("{}/slow", base), Bytes::from_static(b"{}"), None)
        .await;
    assert!(matches!(result, Err(predrelay::client::ClientError::Timeout)));
}

fn relay(upstream_url: String, api_key: Option<&str>) -> axum::Router {
    let config = Config {
        server: ServerConfig {
            port: 0,
            config_file: "config.yaml".to_string(),
        },
        upstream: UpstreamConfig {
            web_service_url: Some(upstream_url),
            api_key: api_key.map(String::from),
            timeout: None,
        },
    };
    let client = HttpPredictionClient::new(None).unwrap();
    create_router(AppState::new(Arc::new(ConfigHolder::new(config)), Arc::new(client)))
}

async fn get_body(app: axum::Router, uri: &str) -> (StatusCode, String) {
    let req = axum::http::Request::builder()
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_relay_end_to_end() {
    let (base, captures) = start_upstream().await;
    let app = relay(format!("{}/score", base), Some("k3y"));

    let (status, body) = get_body(app.clone(), "/api/predict?data=3,4").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Hello, The prediction is: [0.25, 0.75]");

    let (status, body) = get_body(app, "/api/predict/sample?data=yes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Hello, The prediction is: [0.25, 0.75]");

    let captured = captures.lock().unwrap().clone();
    assert_eq!(captured.len(), 2);

    let passthrough: serde_json::Value = serde_json::from_slice(&captured[0].body).unwrap();
    assert_eq!(passthrough, serde_json::json!({"data": ["3", "4"]}));
    assert_eq!(captured[0].authorization, None);

    let sample: serde_json::Value = serde_json::from_slice(&captured[1].body).unwrap();
    let expected = serde_json::json!({
        "data": [[1, 2, 3, 4, 5, 6, 7, 8, 9, 10], [10, 9, 8, 7, 6, 5, 4, 3, 2, 1]]
    });
    assert_eq!(sample, expected);
    assert_eq!(captured[1].authorization.as_deref(), Some("Bearer k3y"));
}

#[tokio::test]
async fn test_relay_upstream_failure() {
    let (base, _) = start_upstream().await;
    let app = relay(format!("{}/broken", base), None);

    let (status, body) = get_body(app, "/api/predict?data=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Unable to get prediction");
}
