//! Root health check.
//!
//! `GET /` answers as long as the process can serve HTTP at all. It does not
//! look at the credential or the upstream, so a missing `CMS_API_KEY` never
//! takes the service out of a load balancer.

use serde::Serialize;

use crate::{Json, Request};

pub const HEALTH_MESSAGE: &str = "FastAPI backend is running!";

#[derive(Debug, Serialize)]
pub struct Health {
    pub message: &'static str,
}

/// Always `200 OK` with `{"message": "FastAPI backend is running!"}`.
pub async fn health_check(_req: Request) -> Json<Health> {
    Json(Health { message: HEALTH_MESSAGE })
}
