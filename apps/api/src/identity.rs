//! Request identity.
//!
//! Authentication itself lives in the fronting layer; by the time a request
//! reaches this service the caller's identity has been resolved and attached
//! as headers. The `ephemeral` flag is an explicit capability: ephemeral
//! identities keep all data in the local fallback store and never reach the
//! remote row store.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::errors::AppError;

pub const IDENTITY_ID_HEADER: &str = "x-identity-id";
pub const IDENTITY_EPHEMERAL_HEADER: &str = "x-identity-ephemeral";

#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub id: Uuid,
    pub ephemeral: bool,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(IDENTITY_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;
        let id = Uuid::parse_str(id).map_err(|_| AppError::Unauthorized)?;

        let ephemeral = parts
            .headers
            .get(IDENTITY_EPHEMERAL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        Ok(Identity { id, ephemeral })
    }
}
