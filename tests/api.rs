//! End-to-end tests: a real quotegate server on an ephemeral port, with
//! wiremock standing in for the marketplace API.

use std::net::SocketAddr;
use std::time::Duration;

use quotegate::config::ApiKey;
use quotegate::quote::{Forwarder, HttpUpstream};
use quotegate::{Server, app};
use serde_json::{Value, json};
use tokio::sync::oneshot;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Shared helpers ────────────────────────────────────────────────────────────

struct Running {
    base: String,
    _shutdown: oneshot::Sender<()>,
}

async fn start(upstream_base: &str, api_key: Option<&str>) -> Running {
    let upstream = HttpUpstream::new(upstream_base).expect("client");
    let forwarder = Forwarder::new(upstream, api_key.and_then(ApiKey::new));

    let server = Server::bind("127.0.0.1:0").await.expect("bind");
    let addr: SocketAddr = server.local_addr().expect("local addr");
    let (tx, rx) = oneshot::channel::<()>();

    tokio::spawn(server.serve_with_shutdown(app::router(forwarder), async move {
        let _ = rx.await;
    }));

    Running { base: format!("http://{addr}"), _shutdown: tx }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

fn quote_body(conditions: &[&str]) -> Value {
    json!({
        "zip_code": "30301",
        "income": 52000,
        "age": 34,
        "household_size": 3,
        "health_conditions": conditions,
    })
}

async fn post_quote(base: &str, body: &Value) -> (u16, Value) {
    let res = client()
        .post(format!("{base}/get-quotes/"))
        .header("content-type", "application/json")
        .body(body.to_string())
        .send()
        .await
        .unwrap();
    let status = res.status().as_u16();
    let text = res.text().await.unwrap();
    (status, serde_json::from_str(&text).unwrap())
}

// ── Health ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_check_runs_without_credential() {
    let app = start("http://127.0.0.1:9", None).await;

    let res = client().get(format!("{}/", app.base)).send().await.unwrap();

    assert_eq!(res.status(), 200);
    let body: Value = serde_json::from_str(&res.text().await.unwrap()).unwrap();
    assert_eq!(body, json!({ "message": "FastAPI backend is running!" }));
}

// ── Forwarding ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn forwards_mapped_query_with_bearer_token() {
    let marketplace = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/plans"))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param("zip", "30301"))
        .and(query_param("income", "52000.0"))
        .and(query_param("age", "34"))
        .and(query_param("householdSize", "3"))
        .and(query_param("conditions", "asthma,diabetes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "plans": [] })))
        .expect(1)
        .mount(&marketplace)
        .await;

    let app = start(&format!("{}/v1", marketplace.uri()), Some("test-token")).await;
    let (status, body) = post_quote(&app.base, &quote_body(&["asthma", "diabetes"])).await;

    assert_eq!(status, 200);
    assert_eq!(body, json!({ "plans": [] }));
}

#[tokio::test]
async fn empty_conditions_are_sent_as_empty_string() {
    let marketplace = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/plans"))
        .and(query_param("conditions", ""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "plans": [{ "id": "p1" }] })))
        .expect(1)
        .mount(&marketplace)
        .await;

    let app = start(&marketplace.uri(), Some("test-token")).await;
    let (status, body) = post_quote(&app.base, &quote_body(&[])).await;

    assert_eq!(status, 200);
    assert_eq!(body, json!({ "plans": [{ "id": "p1" }] }));
}

#[tokio::test]
async fn upstream_error_is_wrapped_with_outer_200() {
    let marketplace = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/plans"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .expect(1)
        .mount(&marketplace)
        .await;

    let app = start(&marketplace.uri(), Some("test-token")).await;
    let (status, body) = post_quote(&app.base, &quote_body(&[])).await;

    assert_eq!(status, 200);
    assert_eq!(body, json!({ "error": 404, "message": "Not Found" }));
}

#[tokio::test]
async fn unreachable_upstream_is_a_transport_error() {
    // Grab a free port, then close it so nothing is listening there.
    let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();

    let app = start(&format!("http://{closed}"), Some("test-token")).await;
    let (status, body) = post_quote(&app.base, &quote_body(&[])).await;

    assert_eq!(status, 200);
    assert_eq!(body["error"], "Internal Server Error");
    assert!(!body["details"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn missing_credential_answers_500_without_calling_upstream() {
    let marketplace = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&marketplace)
        .await;

    let app = start(&marketplace.uri(), None).await;
    let (status, body) = post_quote(&app.base, &quote_body(&[])).await;

    assert_eq!(status, 500);
    assert_eq!(body, json!({ "detail": "CMS API Key is missing" }));
}

#[tokio::test]
async fn malformed_request_never_reaches_upstream() {
    let marketplace = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&marketplace)
        .await;

    let app = start(&marketplace.uri(), Some("test-token")).await;
    let mut body = quote_body(&[]);
    body["age"] = json!("thirty");
    let (status, body) = post_quote(&app.base, &body).await;

    assert_eq!(status, 422);
    assert_eq!(body["detail"][0]["loc"], json!(["body"]));
}

// ── Routing and CORS ──────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_routes_and_methods() {
    let app = start("http://127.0.0.1:9", None).await;

    let res = client().get(format!("{}/nope", app.base)).send().await.unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(res.text().await.unwrap(), r#"{"detail":"Not Found"}"#);

    let res = client().get(format!("{}/get-quotes/", app.base)).send().await.unwrap();
    assert_eq!(res.status(), 405);
    assert_eq!(res.headers()["allow"], "POST");
}

#[tokio::test]
async fn missing_trailing_slash_redirects() {
    let app = start("http://127.0.0.1:9", None).await;

    let res = client()
        .post(format!("{}/get-quotes?src=web", app.base))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 307);
    assert_eq!(res.headers()["location"], "/get-quotes/?src=web");
}

#[tokio::test]
async fn preflight_is_answered_permissively() {
    let app = start("http://127.0.0.1:9", None).await;

    let res = client()
        .request(reqwest::Method::OPTIONS, format!("{}/get-quotes/", app.base))
        .header("origin", "https://quotes.example.app")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let h = res.headers();
    assert_eq!(h["access-control-allow-origin"], "https://quotes.example.app");
    assert_eq!(h["access-control-allow-credentials"], "true");
    assert_eq!(h["access-control-allow-headers"], "content-type");
    assert!(h["access-control-allow-methods"].to_str().unwrap().contains("POST"));
}

#[tokio::test]
async fn cross_origin_responses_carry_cors_headers() {
    let app = start("http://127.0.0.1:9", None).await;

    let res = client()
        .get(format!("{}/", app.base))
        .header("origin", "https://quotes.example.app")
        .send()
        .await
        .unwrap();

    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert_eq!(res.headers()["access-control-allow-credentials"], "true");
}

// ── Shutdown ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn shutdown_closes_idle_keep_alive_connections() {
    let upstream = HttpUpstream::new("http://127.0.0.1:9").expect("client");
    let forwarder = Forwarder::new(upstream, None);

    let server = Server::bind("127.0.0.1:0").await.expect("bind");
    let addr: SocketAddr = server.local_addr().expect("local addr");
    let (tx, rx) = oneshot::channel::<()>();
    let serving = tokio::spawn(server.serve_with_shutdown(app::router(forwarder), async move {
        let _ = rx.await;
    }));

    // The client keeps its pooled connection open after the response.
    let keep_alive = client();
    let res = keep_alive.get(format!("http://{addr}/")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    res.bytes().await.unwrap();

    tx.send(()).unwrap();
    let stopped = tokio::time::timeout(Duration::from_secs(5), serving)
        .await
        .expect("server did not stop with an idle connection open");
    assert!(stopped.unwrap().is_ok());

    drop(keep_alive);
}
