//! HTTP status codes the service answers with.
//!
//! Handlers pick one of these; the upstream's own status codes never become
//! outer statuses (they are reported inside the envelope body instead).

/// The status codes quotegate produces.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    Ok,                   // 200
    TemporaryRedirect,    // 307
    BadRequest,           // 400
    NotFound,             // 404
    MethodNotAllowed,     // 405
    UnprocessableContent, // 422
    InternalServerError,  // 500
}

impl Status {
    pub fn as_u16(self) -> u16 {
        match self {
            Self::Ok                   => 200,
            Self::TemporaryRedirect    => 307,
            Self::BadRequest           => 400,
            Self::NotFound             => 404,
            Self::MethodNotAllowed     => 405,
            Self::UnprocessableContent => 422,
            Self::InternalServerError  => 500,
        }
    }

    /// Reason phrase, used as the `detail` of framework-generated errors.
    pub fn reason(self) -> &'static str {
        match self {
            Self::Ok                   => "OK",
            Self::TemporaryRedirect    => "Temporary Redirect",
            Self::BadRequest           => "Bad Request",
            Self::NotFound             => "Not Found",
            Self::MethodNotAllowed     => "Method Not Allowed",
            Self::UnprocessableContent => "Unprocessable Content",
            Self::InternalServerError  => "Internal Server Error",
        }
    }
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        s.as_u16()
    }
}

impl From<Status> for http::StatusCode {
    fn from(s: Status) -> http::StatusCode {
        // Every variant is a registered code, so this never falls back.
        http::StatusCode::from_u16(s.as_u16()).unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR)
    }
}
