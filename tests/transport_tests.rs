//! HTTP-level tests for the reqwest transport and the assembled client.
//!
//! A local wiremock server stands in for the SellAuth API.

use sellauth::clients::{
    NormalizedRequest, ReqwestTransport, RequestBody, Transport, TransportError,
};
use sellauth::{
    ApiKey, Backoff, BaseUrl, ClientConfig, ErrorCode, HttpMethod, RequestOptions,
    RetryPolicy, SellAuthClient, SellAuthError,
};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, retry: RetryPolicy) -> SellAuthClient {
    let config = ClientConfig::builder()
        .api_key(ApiKey::new("sk_test_key").unwrap())
        .base_url(BaseUrl::new(format!("{}/v1", server.uri())).unwrap())
        .retry(retry)
        .build()
        .unwrap();
    SellAuthClient::new(config).unwrap()
}

fn fast_retry(attempts: u32) -> RetryPolicy {
    RetryPolicy::with_attempts(attempts)
        .backoff(Backoff::Fixed)
        .base_delay(Duration::from_millis(5))
}

fn raw_request(method: HttpMethod, url: String, body: RequestBody) -> NormalizedRequest {
    let mut req = NormalizedRequest::new(method, url, Duration::from_secs(5));
    req.set_header("X-Test", "1");
    req.body = body;
    req
}

// ============================================================================
// ReqwestTransport
// ============================================================================

#[tokio::test]
async fn test_get_body_is_dropped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new().unwrap();
    let req = raw_request(
        HttpMethod::Get,
        format!("{}/ping", server.uri()),
        RequestBody::Json("{\"ignored\":true}".to_string()),
    );
    let mut res = assert_ok!(transport.execute(&req).await);
    assert_eq!(res.status, 200);
    assert_eq!(res.text().await.unwrap(), "");

    let received = server.received_requests().await.unwrap();
    assert!(received[0].body.is_empty());
}

#[tokio::test]
async fn test_post_body_and_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ping"))
        .and(header("x-test", "1"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("X-Request-Id", "req_42")
                .insert_header("Retry-After", "3")
                .set_body_string("created"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new().unwrap();
    let req = raw_request(
        HttpMethod::Post,
        format!("{}/ping", server.uri()),
        RequestBody::Text("payload".to_string()),
    );
    let mut res = transport.execute(&req).await.unwrap();

    assert_eq!(res.status, 201);
    assert_eq!(res.request_id(), Some("req_42"));
    assert_eq!(res.retry_after(), Some(Duration::from_secs(3)));
    assert!(res.headers.contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "created");
    // A second read returns the buffered copy.
    assert_eq!(res.text().await.unwrap(), "created");

    let received = server.received_requests().await.unwrap();
    assert_eq!(received[0].body, b"payload");
}

#[tokio::test]
async fn test_timeout_aborts_with_timeout_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new().unwrap();
    let mut req = raw_request(HttpMethod::Get, server.uri(), RequestBody::Empty);
    req.timeout = Duration::from_millis(50);

    let error = assert_err!(transport.execute(&req).await);
    assert!(matches!(
        error,
        SellAuthError::Transport(TransportError::Timeout { timeout_ms: 50 })
    ));
    assert_eq!(error.code(), Some(ErrorCode::Timeout));
}

#[tokio::test]
async fn test_cancellation_aborts_the_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
        canceller.cancel();
    });

    let transport = ReqwestTransport::new().unwrap();
    let mut req = raw_request(HttpMethod::Get, server.uri(), RequestBody::Empty);
    req.signal = Some(token);

    let error = transport.execute(&req).await.unwrap_err();
    assert_eq!(error.code(), Some(ErrorCode::Aborted));
}

/// Serves `200` headers announcing a 100-byte body, writes five bytes and
/// then stalls.
async fn stalled_body_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0_u8; 4096];
                let _ = socket.read(&mut buf).await;
                let head = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n";
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(b"{\"a\":").await;
                let _ = socket.flush().await;
                tokio::time::sleep(Duration::from_secs(30)).await;
            });
        }
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_timeout_covers_stalled_body() {
    let uri = stalled_body_server().await;
    let transport = ReqwestTransport::new().unwrap();
    let mut req = raw_request(HttpMethod::Get, format!("{uri}/shops"), RequestBody::Empty);
    req.timeout = Duration::from_millis(200);

    let mut res = assert_ok!(transport.execute(&req).await);
    assert_eq!(res.status, 200);

    let read = tokio::time::timeout(Duration::from_secs(3), res.text()).await;
    let error = read.expect("body read should end at the request deadline").unwrap_err();
    assert_eq!(error.code(), Some(ErrorCode::Timeout));
}

#[tokio::test]
async fn test_cancellation_covers_stalled_body() {
    let uri = stalled_body_server().await;
    let token = CancellationToken::new();
    let transport = ReqwestTransport::new().unwrap();
    let mut req = raw_request(HttpMethod::Get, format!("{uri}/shops"), RequestBody::Empty);
    req.signal = Some(token.clone());

    let mut res = assert_ok!(transport.execute(&req).await);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let read = tokio::time::timeout(Duration::from_secs(3), res.text()).await;
    let error = read.expect("body read should stop on cancellation").unwrap_err();
    assert_eq!(error.code(), Some(ErrorCode::Aborted));
}

#[tokio::test]
async fn test_client_timeout_covers_stalled_body() {
    let uri = stalled_body_server().await;
    let config = ClientConfig::builder()
        .api_key(ApiKey::new("sk_test_key").unwrap())
        .base_url(BaseUrl::new(format!("{uri}/v1")).unwrap())
        .timeout(Duration::from_millis(200))
        .retry(RetryPolicy::disabled())
        .build()
        .unwrap();
    let client = SellAuthClient::new(config).unwrap();

    let call = client.request::<Value>(HttpMethod::Get, "/shops", RequestOptions::new());
    let result = tokio::time::timeout(Duration::from_secs(3), call).await;
    let error = result.expect("request should end at its timeout").unwrap_err();
    assert_eq!(error.code(), Some(ErrorCode::Timeout));
}

// ============================================================================
// Full client
// ============================================================================

#[tokio::test]
async fn test_client_sends_auth_query_and_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/shops/7/products"))
        .and(header("authorization", "Bearer sk_test_key"))
        .and(header("accept", "application/json"))
        .and(header("content-type", "application/json"))
        .and(query_param("statuses[0]", "pending"))
        .and(query_param("statuses[1]", "paid"))
        .and(body_json(json!({"name": "License"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, RetryPolicy::default());
    let value: Value = client
        .request(
            HttpMethod::Post,
            "/shops/7/products",
            RequestOptions::new()
                .query(json!({"statuses": ["pending", "paid"], "skip": null}))
                .json(json!({"name": "License"})),
        )
        .await
        .unwrap();

    assert_eq!(value, json!({"id": 1}));
    let received = server.received_requests().await.unwrap();
    let query = received[0].url.query().unwrap_or_default().to_string();
    assert!(!query.contains("skip"));
}

#[tokio::test]
async fn test_client_reports_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/shops/1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "not found"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, RetryPolicy::default());
    let error = client
        .request::<Value>(HttpMethod::Get, "/shops/1", RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(error.status(), Some(404));
    assert_eq!(error.to_string(), "not found");
}

#[tokio::test]
async fn test_client_retries_transient_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/shops"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/shops"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 3, "name": "Main"}])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, fast_retry(3));
    let shops = client.shops().list().await.unwrap();

    assert_eq!(shops.len(), 1);
    assert_eq!(shops[0].name, "Main");
}

#[tokio::test]
async fn test_client_timeout_surfaces_timeout_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let client = client_for(&server, fast_retry(2));
    let error = client
        .request::<Value>(
            HttpMethod::Get,
            "/shops",
            RequestOptions::new().timeout(Duration::from_millis(40)),
        )
        .await
        .unwrap_err();

    assert_eq!(error.code(), Some(ErrorCode::Timeout));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_pdf_is_returned_as_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/shops/1/invoices/9/pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_string("%PDF-1.7"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, RetryPolicy::default());
    let pdf = client.invoices(1).pdf(9).await.unwrap();
    assert_eq!(pdf, "%PDF-1.7");
}
