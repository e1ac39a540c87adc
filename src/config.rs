//! Configuration from environment variables.
//!
//! Read once in `main` and handed to the pieces that need it; nothing else in
//! the crate looks at the process environment.
//!
//! **Environment variables:**
//! - `CMS_API_KEY`: bearer token for the marketplace API. Unset or empty is
//!   not a startup error; quote requests answer 500 until it is provided.
//! - `CMS_BASE_URL`: marketplace API base (default: the CMS v1 endpoint)
//! - `BIND_ADDR`: listen address (default: `0.0.0.0:8000`)

use std::env;
use std::fmt;

pub const DEFAULT_BASE_URL: &str = "https://developer.cms.gov/marketplace-api/v1";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// The marketplace bearer token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` for an empty token, which counts as missing.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        (!token.is_empty()).then_some(Self(token))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<ApiKey>,
    pub base_url: String,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            api_key: lookup("CMS_API_KEY").and_then(ApiKey::new),
            base_url: lookup("CMS_BASE_URL")
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            bind_addr: lookup("BIND_ADDR")
                .filter(|addr| !addr.is_empty())
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        }
    }

    pub fn base_url_trimmed(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
