use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

/// JSON body extractor that answers an unparseable body with
/// `503 Service Unavailable` and the plain-text parse error.
///
/// Existing clients rely on the 503, so it is kept instead of axum's 4xx
/// rejections.
pub struct DomainJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for DomainJson<T>
where
    T: DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            let message = e.body_text();
            tracing::warn!(error = %message, "Rejected domain body");
            (StatusCode::SERVICE_UNAVAILABLE, message).into_response()
        })?;

        Ok(DomainJson(value))
    }
}
