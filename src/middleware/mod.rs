//! Middleware layer.
//!
//! Cross-cutting concerns that wrap every request regardless of route. The
//! server runs them around routing:
//!
//! - [`Cors`] answers preflights before routing and decorates every
//!   response afterwards.

mod cors;

pub use cors::Cors;
