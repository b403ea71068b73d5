use std::time::Duration;

use axum::{
    Router,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
};
use bytes::Bytes;
use chunkfeed::net::{Headers, HttpClient, Net, NetError, NetExt, NetOptions};
use chunkfeed_test_utils::TestHttpServer;
use rstest::rstest;

async fn router() -> TestHttpServer {
    let router = Router::new()
        .route("/ok", get(|| async { "payload" }))
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .route("/gone", get(|| async { StatusCode::GONE }))
        .route(
            "/boom",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
        )
        .route("/unavailable", get(|| async { StatusCode::SERVICE_UNAVAILABLE }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        )
        .route("/echo-auth", get(echo_auth));
    TestHttpServer::new(router).await
}

async fn echo_auth(headers: HeaderMap) -> impl IntoResponse {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none")
        .to_string()
}

#[tokio::test]
async fn test_get_bytes_returns_body() {
    let server = router().await;
    let client = HttpClient::new(NetOptions::default()).unwrap();

    let body = client.get_bytes(server.url("/ok"), None).await.unwrap();
    assert_eq!(body, Bytes::from_static(b"payload"));
}

#[rstest]
#[case::not_found("/missing", 404, true)]
#[case::gone("/gone", 410, true)]
#[case::server_error("/boom", 500, false)]
#[case::unavailable("/unavailable", 503, false)]
#[tokio::test]
async fn test_error_status_is_surfaced(
    #[case] path: &str,
    #[case] status: u16,
    #[case] not_found: bool,
) {
    let server = router().await;
    let client = HttpClient::new(NetOptions::default()).unwrap();

    let error = client.get_bytes(server.url(path), None).await.unwrap_err();
    assert_eq!(error.status_code(), Some(status));
    assert_eq!(error.is_not_found(), not_found);
}

#[tokio::test]
async fn test_error_body_is_kept() {
    let server = router().await;
    let client = HttpClient::new(NetOptions::default()).unwrap();

    match client.get_bytes(server.url("/boom"), None).await {
        Err(NetError::HttpError { body, .. }) => {
            assert_eq!(body.as_deref(), Some("upstream exploded"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_request_timeout_from_options() {
    let server = router().await;
    let options = NetOptions::default().with_request_timeout(Duration::from_millis(50));
    let client = HttpClient::new(options).unwrap();

    let error = client.get_bytes(server.url("/slow"), None).await.unwrap_err();
    assert!(error.is_timeout(), "expected timeout, got {error:?}");
}

#[tokio::test]
async fn test_timeout_decorator() {
    let server = router().await;
    let client = HttpClient::new(NetOptions::default())
        .unwrap()
        .with_timeout(Duration::from_millis(50));

    let error = client.get_bytes(server.url("/slow"), None).await.unwrap_err();
    assert!(matches!(error, NetError::Timeout));
}

#[rstest]
#[case::from_options(true, None, "Bearer options")]
#[case::per_request(false, Some("Bearer call"), "Bearer call")]
#[case::absent(false, None, "none")]
#[tokio::test]
async fn test_headers_are_sent(
    #[case] in_options: bool,
    #[case] per_call: Option<&str>,
    #[case] expected: &str,
) {
    let server = router().await;
    let mut options = NetOptions::default();
    if in_options {
        let mut headers = Headers::new();
        headers.insert("authorization", "Bearer options");
        options = options.with_headers(headers);
    }
    let client = HttpClient::new(options).unwrap();
    let call_headers = per_call.map(|value| {
        let mut headers = Headers::new();
        headers.insert("authorization", value);
        headers
    });

    let body = client
        .get_bytes(server.url("/echo-auth"), call_headers)
        .await
        .unwrap();
    assert_eq!(body, Bytes::from(expected.to_string()));
}

#[tokio::test]
async fn test_connection_refused_is_not_a_status() {
    let server = router().await;
    let url = server.url("/ok");
    drop(server);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = HttpClient::new(NetOptions::default()).unwrap();
    let error = client.get_bytes(url, None).await.unwrap_err();
    assert_eq!(error.status_code(), None);
}
