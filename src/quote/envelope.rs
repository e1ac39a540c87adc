//! The uniform body returned for a quote request, whatever happened upstream.

use serde::Serialize;
use serde_json::Value;

use crate::response::{IntoResponse, Json, Response};
use crate::status::Status;

use super::upstream::TransportError;

pub const MISSING_CREDENTIAL: &str = "CMS API Key is missing";
const TRANSPORT_LABEL: &str = "Internal Server Error";

/// Exactly one of: the upstream's decoded body, or one error shape.
///
/// Upstream and transport failures are still sent with an outer `200 OK`;
/// only the missing credential is a `500`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    /// 2xx from upstream, body passed through unchanged.
    Upstream(Value),
    /// Non-2xx from upstream: its status and raw body text.
    UpstreamFailure { error: u16, message: String },
    /// The exchange never produced a usable reply.
    Transport { error: &'static str, details: String },
    /// No credential configured; nothing was sent upstream.
    MissingCredential { detail: &'static str },
}

impl ResponseEnvelope {
    pub fn upstream_failure(status: u16, body: String) -> Self {
        Self::UpstreamFailure { error: status, message: body }
    }

    pub fn transport(err: TransportError) -> Self {
        Self::Transport { error: TRANSPORT_LABEL, details: err.to_string() }
    }

    pub fn missing_credential() -> Self {
        Self::MissingCredential { detail: MISSING_CREDENTIAL }
    }

    pub fn status(&self) -> Status {
        match self {
            Self::MissingCredential { .. } => Status::InternalServerError,
            _ => Status::Ok,
        }
    }
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        let status = self.status();
        Json(self).with_status(status)
    }
}
