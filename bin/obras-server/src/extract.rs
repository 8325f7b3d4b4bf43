//! Request extractors whose rejections become [`ServerError`]s.

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use obras_core::ObraId;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ServerError;

/// JSON body that must deserialize and pass [`Validate`].
///
/// Every failure (bad syntax, wrong or missing fields, validation) is a 422.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value
            .validate()
            .map_err(|e| ServerError::Validation(e.to_string()))?;
        Ok(Self(value))
    }
}

/// The `{update_id}` / `{delete_id}` path segment.
#[derive(Debug, Clone, Copy, Deserialize, FromRequestParts)]
#[from_request(via(Path), rejection(ServerError))]
pub struct ObraIdPath(pub ObraId);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header;
    use obras_core::CreateObra;

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    async fn extract(body: &str) -> Result<ValidatedJson<CreateObra>, ServerError> {
        ValidatedJson::<CreateObra>::from_request(json_request(body), &()).await
    }

    #[tokio::test]
    async fn accepts_valid_body() {
        let ValidatedJson(obra) =
            extract(r#"{"titulo":"A","editora":"E","foto":"u","autores":["X"]}"#)
                .await
                .unwrap();
        assert_eq!(obra.title, "A");
    }

    #[tokio::test]
    async fn wrong_type_is_validation_error() {
        let err = extract(r#"{"titulo":"A","editora":"E","foto":"u","autores":"X"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Validation(_)));
    }

    #[tokio::test]
    async fn missing_field_is_validation_error() {
        let err = extract(r#"{"titulo":"A","editora":"E","foto":"u"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Validation(_)));
    }

    #[tokio::test]
    async fn syntax_error_is_validation_error() {
        let err = extract("{not json").await.unwrap_err();
        assert!(matches!(err, ServerError::Validation(_)));
    }

    #[tokio::test]
    async fn empty_title_is_validation_error() {
        let err = extract(r#"{"titulo":"","editora":"E","foto":"u","autores":[]}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Validation(_)));
    }
}
