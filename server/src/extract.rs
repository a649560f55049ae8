use axum::body::{to_bytes, Body};
use axum::extract::{FromRequest, Path, Query, Request};
use axum::Json;
use axum_extra::extract::WithRejection;
use serde::de::DeserializeOwned;

use kernel::{reject, KernelError};

use crate::error::ErrorStatus;

const BODY_LIMIT: usize = 2 * 1024 * 1024;

pub type JsonBody<T> = WithRejection<Json<T>, ErrorStatus>;
pub type QueryParams<T> = WithRejection<Query<T>, ErrorStatus>;
pub type PathParam<T> = WithRejection<Path<T>, ErrorStatus>;

/// JSON body that may be left out. Only an empty body falls back to `T::default()`;
/// a body that is present must be valid JSON sent as `application/json`.
pub struct OptionalJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default + Send,
    S: Send + Sync,
{
    type Rejection = ErrorStatus;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let bytes = to_bytes(body, BODY_LIMIT)
            .await
            .map_err(|e| ErrorStatus::from(reject(KernelError::Validation, e.to_string())))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }
        let Json(value) = Json::<T>::from_request(Request::from_parts(parts, Body::from(bytes)), state)
            .await?;
        Ok(Self(value))
    }
}
