//! Request extractors with the API's error body.

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    response::Response,
    Json,
};
use serde::de::DeserializeOwned;

use crate::app::errors;

/// `Json<T>` whose rejections (bad syntax, wrong types, out-of-range numbers, missing
/// content type) answer 400 `invalid_argument` instead of axum's plain-text 4xx.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(errors::invalid_argument(rejection.body_text())),
        }
    }
}
