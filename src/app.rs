//! Route table for the quote service.

use std::sync::Arc;

use tracing::debug;

use crate::health::health_check;
use crate::quote::{Forwarder, QuoteRequest, UpstreamClient};
use crate::{IntoResponse, Request, Response, Router};

/// `GET /` and `POST /get-quotes/`, with `forwarder` shared by every request.
pub fn router<C: UpstreamClient>(forwarder: Forwarder<C>) -> Router {
    let forwarder = Arc::new(forwarder);

    Router::new()
        .get("/", health_check)
        .post("/get-quotes/", move |req: Request| {
            let forwarder = Arc::clone(&forwarder);
            async move { get_quotes(&forwarder, req).await }
        })
}

async fn get_quotes<C: UpstreamClient>(forwarder: &Forwarder<C>, req: Request) -> Response {
    let quote = match QuoteRequest::from_json(req.body()) {
        Ok(quote) => quote,
        Err(e) => {
            debug!(error = %e, "rejected quote request");
            return e.into_response();
        }
    };

    forwarder.forward(quote).await.into_response()
}
