//! Unified error type.

use thiserror::Error as ThisError;

/// The error type returned by quotegate's fallible startup operations.
///
/// Request-level failures (422, 500, upstream errors) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// infrastructure failures: parsing the listen address, binding the port,
/// building the outbound HTTP client.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address `{addr}`: {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
