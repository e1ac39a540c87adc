//! # quotegate
//!
//! A minimal HTTP proxy in front of a health-insurance marketplace API.
//!
//! One endpoint accepts a quote request, forwards it as a GET query to the
//! marketplace with a server-held bearer token, and relays the answer (or an
//! error envelope) back to the caller. No state, no retries, no caching.
//!
//! | Method | Path | Response |
//! |---|---|---|
//! | `GET` | `/` | `{"message": "FastAPI backend is running!"}` |
//! | `POST` | `/get-quotes/` | upstream body, or `{error, message\|details}` |
//!
//! The HTTP layer underneath is small and self-contained: hyper for the
//! protocol, [`matchit`] for routing, graceful shutdown on SIGTERM / Ctrl-C,
//! and a permissive CORS policy on every response.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use quotegate::{Config, Server, app, quote::{Forwarder, HttpUpstream}};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), quotegate::Error> {
//!     let config = Config::from_env();
//!     let upstream = HttpUpstream::new(config.base_url_trimmed())?;
//!     let forwarder = Forwarder::new(upstream, config.api_key.clone());
//!
//!     Server::bind(&config.bind_addr).await?.serve(app::router(forwarder)).await
//! }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod app;
pub mod config;
pub mod health;
pub mod middleware;
pub mod quote;

pub use config::Config;
pub use error::Error;
pub use handler::Handler;
pub use method::{Method, UnknownMethod};
pub use request::Request;
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use status::Status;
