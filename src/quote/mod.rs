//! Quote forwarding: validate the inbound request, query the marketplace,
//! translate the outcome.
//!
//! ```text
//! POST body ──► QuoteRequest::from_json ──► Forwarder::forward ──► ResponseEnvelope
//!                  │ 422 on bad shape          │ UpstreamClient::fetch_plans
//! ```

mod envelope;
mod forwarder;
mod request;
mod upstream;

pub use envelope::{MISSING_CREDENTIAL, ResponseEnvelope};
pub use forwarder::Forwarder;
pub use request::{QuoteRequest, ValidationError};
pub use upstream::{HttpUpstream, TransportError, UpstreamClient, UpstreamQuery, UpstreamReply};
