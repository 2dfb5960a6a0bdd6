use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use catalog_core::DomainError;

use crate::app::services::ServiceError;

/// Default mapping from service errors to responses. Handlers with their own status
/// rules pick the status and reuse [`json_error`] directly.
pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::InvalidArgument(msg) => invalid_argument(msg),
        ServiceError::NotFound(msg) => not_found(msg),
        ServiceError::Store(e) => internal(e.to_string()),
    }
}

pub fn invalid_argument(message: impl Into<String>) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_argument", message)
}

pub fn not_found(message: impl Into<String>) -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "not_found", message)
}

pub fn internal(message: impl Into<String>) -> axum::response::Response {
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Parse a path identifier, answering 400 on failure.
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: std::str::FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(|e| invalid_argument(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_infra::StoreError;

    #[test]
    fn service_errors_map_to_status() {
        let cases = [
            (ServiceError::InvalidArgument("bad".into()), StatusCode::BAD_REQUEST),
            (ServiceError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (
                ServiceError::Store(StoreError::Database("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(service_error_to_response(err).status(), status);
        }
    }
}
