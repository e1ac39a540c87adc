//! The marketplace API as seen from the forwarder.
//!
//! [`UpstreamClient`] is the seam: one GET of the plans resource, returning
//! either the completed exchange or a [`TransportError`]. Production code
//! uses [`HttpUpstream`] (reqwest); tests swap in a fake.

use std::error::Error as StdError;
use std::future::Future;

use thiserror::Error;

use crate::config::ApiKey;

use super::request::QuoteRequest;

/// Query parameters sent upstream, in wire order.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamQuery {
    pairs: Vec<(&'static str, String)>,
}

impl UpstreamQuery {
    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| *k == name).map(|(_, v)| v.as_str())
    }
}

impl From<&QuoteRequest> for UpstreamQuery {
    fn from(req: &QuoteRequest) -> Self {
        Self {
            pairs: vec![
                ("zip", req.zip_code.clone()),
                ("income", format_income(req.income)),
                ("age", req.age.to_string()),
                ("householdSize", req.household_size.to_string()),
                ("conditions", req.health_conditions.join(",")),
            ],
        }
    }
}

/// Floats always carry a fractional part on the wire: `50000.0`, not `50000`.
/// Renders income the way the marketplace's existing clients do: shortest
/// round-trip digits, always with a fractional part, switching to `1e+16`
/// style exponents at 1e16 and below 1e-4.
fn format_income(income: f64) -> String {
    if !income.is_finite() {
        return match income {
            f if f.is_nan() => "nan".to_owned(),
            f if f > 0.0 => "inf".to_owned(),
            _ => "-inf".to_owned(),
        };
    }

    let magnitude = income.abs();
    if magnitude >= 1e16 || (magnitude != 0.0 && magnitude < 1e-4) {
        let sci = format!("{income:e}");
        let (mantissa, exp) = sci.split_once('e').unwrap_or((&sci, "0"));
        let exp: i32 = exp.parse().unwrap_or(0);
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exp.unsigned_abs());
    }

    let plain = income.to_string();
    if plain.contains('.') { plain } else { plain + ".0" }
}

/// A completed upstream exchange, any status.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: String,
}

impl UpstreamReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The upstream call failed before producing a usable reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(String);

impl TransportError {
    pub fn new(description: impl Into<String>) -> Self {
        Self(description.into())
    }
}

/// Flattens the source chain into one line, e.g.
/// `error sending request for url (...): client error (Connect): tcp connect error: Connection refused`.
impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let mut description = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            description.push_str(": ");
            description.push_str(&cause.to_string());
            source = cause.source();
        }
        Self(description)
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self(err.to_string())
    }
}

/// One GET of the upstream plans resource.
pub trait UpstreamClient: Send + Sync + 'static {
    fn fetch_plans(
        &self,
        api_key: &ApiKey,
        query: &UpstreamQuery,
    ) -> impl Future<Output = Result<UpstreamReply, TransportError>> + Send;
}

/// reqwest-backed client for `<base_url>/plans`.
///
/// No timeout is configured: a stalled upstream holds only its own request.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    plans_url: String,
}

impl HttpUpstream {
    pub fn new(base_url: &str) -> Result<Self, crate::Error> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            plans_url: format!("{}/plans", base_url.trim_end_matches('/')),
        }
    }

    pub fn plans_url(&self) -> &str {
        &self.plans_url
    }
}

impl UpstreamClient for HttpUpstream {
    async fn fetch_plans(
        &self,
        api_key: &ApiKey,
        query: &UpstreamQuery,
    ) -> Result<UpstreamReply, TransportError> {
        let response = self
            .client
            .get(&self.plans_url)
            .bearer_auth(api_key.expose())
            .query(query.pairs())
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(UpstreamReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(conditions: &[&str]) -> QuoteRequest {
        QuoteRequest {
            zip_code: "30301".into(),
            income: 50000.0,
            age: 41,
            household_size: 2,
            health_conditions: conditions.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn maps_fields_in_wire_order() {
        let query = UpstreamQuery::from(&quote(&["asthma", "copd"]));
        let names: Vec<&str> = query.pairs().iter().map(|(k, _)| *k).collect();
        assert_eq!(names, ["zip", "income", "age", "householdSize", "conditions"]);
        assert_eq!(query.get("zip"), Some("30301"));
        assert_eq!(query.get("income"), Some("50000.0"));
        assert_eq!(query.get("age"), Some("41"));
        assert_eq!(query.get("householdSize"), Some("2"));
        assert_eq!(query.get("conditions"), Some("asthma,copd"));
    }

    #[test]
    fn empty_conditions_join_to_empty_string() {
        let query = UpstreamQuery::from(&quote(&[]));
        assert_eq!(query.get("conditions"), Some(""));
    }

    #[test]
    fn embedded_commas_are_not_escaped() {
        let query = UpstreamQuery::from(&quote(&["heart disease, mild", "asthma"]));
        assert_eq!(query.get("conditions"), Some("heart disease, mild,asthma"));
    }

    #[test]
    fn income_keeps_fraction() {
        assert_eq!(format_income(42.5), "42.5");
        assert_eq!(format_income(0.0), "0.0");
        assert_eq!(format_income(0.0001), "0.0001");
    }

    #[test]
    fn large_incomes_stay_fixed_point_below_1e16() {
        assert_eq!(format_income(123456789012345.0), "123456789012345.0");
        assert_eq!(format_income(1e15), "1000000000000000.0");
        assert_eq!(format_income(9007199254740993.0), "9007199254740992.0");
    }

    #[test]
    fn extreme_incomes_use_signed_two_digit_exponent() {
        assert_eq!(format_income(1e16), "1e+16");
        assert_eq!(format_income(2.5e20), "2.5e+20");
        assert_eq!(format_income(1.5e-5), "1.5e-05");
        assert_eq!(format_income(-3e100), "-3e+100");
    }

    #[test]
    fn plans_url_trims_trailing_slash() {
        let upstream = HttpUpstream::with_client(reqwest::Client::new(), "http://127.0.0.1:9/v1/");
        assert_eq!(upstream.plans_url(), "http://127.0.0.1:9/v1/plans");
    }

    #[test]
    fn success_is_any_2xx() {
        let reply = |status| UpstreamReply { status, body: String::new() };
        assert!(reply(200).is_success());
        assert!(reply(204).is_success());
        assert!(!reply(304).is_success());
        assert!(!reply(404).is_success());
    }
}
