//! Offline quotegate demo: the real routes, a canned marketplace.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example quote
//!
//! Try:
//!   curl http://localhost:8000/
//!   curl -X POST http://localhost:8000/get-quotes/ \
//!        -H 'content-type: application/json' \
//!        -d '{"zip_code":"30301","income":52000,"age":34,"household_size":3,"health_conditions":["asthma"]}'

use quotegate::config::ApiKey;
use quotegate::quote::{Forwarder, TransportError, UpstreamClient, UpstreamQuery, UpstreamReply};
use quotegate::{Server, app};

/// Answers every query with one plan that echoes the query back.
struct CannedMarketplace;

impl UpstreamClient for CannedMarketplace {
    async fn fetch_plans(
        &self,
        _api_key: &ApiKey,
        query: &UpstreamQuery,
    ) -> Result<UpstreamReply, TransportError> {
        let echoed: serde_json::Map<String, serde_json::Value> = query
            .pairs()
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::from(v.as_str())))
            .collect();
        let body = serde_json::json!({
            "plans": [{ "id": "demo-silver-01", "premium": 312.4, "query": echoed }],
            "total": 1,
        });
        Ok(UpstreamReply { status: 200, body: body.to_string() })
    }
}

#[tokio::main]
async fn main() -> Result<(), quotegate::Error> {
    tracing_subscriber::fmt::init();

    let forwarder = Forwarder::new(CannedMarketplace, ApiKey::new("demo-token"));

    Server::bind("0.0.0.0:8000")
        .await?
        .serve(app::router(forwarder))
        .await
}
