use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::headers::{self, Header};
use axum_extra::TypedHeader;
use tracing::debug;
use uuid::Uuid;

use crate::response::Envelope;

static PRINCIPAL_ID: HeaderName = HeaderName::from_static("x-principal-id");

/// `x-principal-id`: the customer id forwarded by the identity provider in front of this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrincipalId(Uuid);

impl Header for PrincipalId {
    fn name() -> &'static HeaderName {
        &PRINCIPAL_ID
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        I: Iterator<Item = &'i HeaderValue>,
    {
        values
            .next()
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .map(PrincipalId)
            .ok_or_else(headers::Error::invalid)
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        if let Ok(value) = HeaderValue::from_str(&self.0.hyphenated().to_string()) {
            values.extend(std::iter::once(value));
        }
    }
}

/// The authenticated customer on whose behalf a request runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal(Uuid);

impl Principal {
    pub fn customer_id(&self) -> Uuid {
        self.0
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = Unauthenticated;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(PrincipalId(id)) = TypedHeader::<PrincipalId>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                debug!(%rejection, "request without a usable principal");
                Unauthenticated
            })?;
        Ok(Principal(id))
    }
}

#[derive(Debug)]
pub struct Unauthenticated;

impl IntoResponse for Unauthenticated {
    fn into_response(self) -> axum::response::Response {
        let envelope = Envelope::failure("Authentication credentials were not provided.", None);
        (StatusCode::UNAUTHORIZED, Json(envelope)).into_response()
    }
}

#[cfg(test)]
impl Principal {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }
}
