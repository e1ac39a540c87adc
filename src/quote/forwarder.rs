//! Forwards a validated quote request to the marketplace API.

use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::ApiKey;

use super::envelope::ResponseEnvelope;
use super::request::QuoteRequest;
use super::upstream::{HttpUpstream, TransportError, UpstreamClient, UpstreamQuery};

/// Holds the injected credential and upstream client. Shared read-only
/// across connections.
pub struct Forwarder<C = HttpUpstream> {
    client: C,
    api_key: Option<ApiKey>,
}

impl<C: UpstreamClient> Forwarder<C> {
    pub fn new(client: C, api_key: Option<ApiKey>) -> Self {
        Self { client, api_key }
    }

    /// One pass, two decisions: credential present, then status class.
    pub async fn forward(&self, request: QuoteRequest) -> ResponseEnvelope {
        let Some(api_key) = &self.api_key else {
            warn!("CMS_API_KEY is not set, refusing to forward quote request");
            return ResponseEnvelope::missing_credential();
        };

        let query = UpstreamQuery::from(&request);
        let reply = match self.client.fetch_plans(api_key, &query).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "marketplace request failed");
                return ResponseEnvelope::transport(e);
            }
        };

        info!(status = reply.status, body = %reply.body, "marketplace response");

        if !reply.is_success() {
            return ResponseEnvelope::upstream_failure(reply.status, reply.body);
        }

        match serde_json::from_str::<Value>(&reply.body) {
            Ok(body) => ResponseEnvelope::Upstream(body),
            Err(e) => {
                error!(error = %e, "marketplace returned a non-JSON success body");
                ResponseEnvelope::transport(TransportError::from(e))
            }
        }
    }
}
