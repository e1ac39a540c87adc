//! Permissive CORS: every origin, method and header, credentials included.
//!
//! Browsers reject `Access-Control-Allow-Origin: *` on credentialed requests,
//! so the origin is echoed back whenever credentials are in play (preflights
//! and requests carrying a cookie). `Vary: Origin` marks those responses as
//! origin-specific for caches.
//!
//! The policy is wide open. Restrict it to the frontend's origin before
//! exposing the service publicly.

use http::header::{self, HeaderMap, HeaderValue};

use crate::method::Method;
use crate::request::Request;
use crate::response::Response;

const ALLOW_METHODS: &str = "DELETE, GET, HEAD, OPTIONS, PATCH, POST, PUT";
const MAX_AGE: &str = "600";

/// The CORS policy applied by the server.
#[derive(Debug, Clone, Default)]
pub struct Cors {
    _private: (),
}

impl Cors {
    /// Allow all origins, methods, headers and credentials.
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Answers a preflight request, or returns `None` if `req` is not one.
    ///
    /// A preflight is an `OPTIONS` request carrying both `Origin` and
    /// `Access-Control-Request-Method`. It never reaches a handler.
    pub fn preflight(&self, req: &Request) -> Option<Response> {
        if req.method() != Method::Options {
            return None;
        }
        let headers = req.headers();
        let origin = headers.get(header::ORIGIN)?;
        headers.get(header::ACCESS_CONTROL_REQUEST_METHOD)?;

        let mut res = Response::text("OK");
        let out = res.headers_mut();
        out.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        out.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
        out.insert(header::ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        out.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE));
        if let Some(requested) = headers.get(header::ACCESS_CONTROL_REQUEST_HEADERS) {
            out.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
        }
        out.append(header::VARY, HeaderValue::from_static("Origin"));
        Some(res)
    }

    /// Adds CORS headers to a routed response. Requests without `Origin`
    /// are same-origin or non-browser calls and are left untouched, and so
    /// is a response that already carries `Access-Control-Allow-Origin`
    /// (a preflight answer keeps its echoed origin).
    pub fn decorate(&self, request_headers: &HeaderMap, res: &mut Response) {
        let Some(origin) = request_headers.get(header::ORIGIN) else {
            return;
        };
        if res.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN) {
            return;
        }

        let out = res.headers_mut();
        if request_headers.contains_key(header::COOKIE) {
            out.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
            out.append(header::VARY, HeaderValue::from_static("Origin"));
        } else {
            out.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        }
        out.insert(header::ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
    }
}
