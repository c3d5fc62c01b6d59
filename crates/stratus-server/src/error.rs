//! Service error → HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use stratus_services::ServiceError;

/// Wrapper so handlers can use `?` on service results.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

/// Status code for each error kind. Local validation problems are the
/// caller's fault (400), upstream trouble is a gateway problem (502),
/// and a reachable provider with no data is 422.
pub fn status_for(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::InvalidInput(_)
        | ServiceError::DateRange(_)
        | ServiceError::LocationNotFound(_) => StatusCode::BAD_REQUEST,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::NoDataForRange { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::Upstream(_) => StatusCode::BAD_GATEWAY,
        ServiceError::MissingApiKey(_) => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::Persistence(_) | ServiceError::Export(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(kind = self.0.kind(), "request failed: {}", self.0);
        } else {
            tracing::debug!(kind = self.0.kind(), "request rejected: {}", self.0);
        }

        let body = Json(serde_json::json!({
            "error": {
                "kind": self.0.kind(),
                "message": self.0.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratus_weather::DateRangeError;

    #[test]
    fn validation_failures_are_bad_requests() {
        assert_eq!(
            status_for(&ServiceError::InvalidInput("empty".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&ServiceError::DateRange(DateRangeError::MalformedDate("x".into()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&ServiceError::LocationNotFound("Atlantis".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn missing_records_are_not_found() {
        assert_eq!(status_for(&ServiceError::NotFound(7)), StatusCode::NOT_FOUND);
    }

    #[test]
    fn upstream_failures_are_gateway_errors() {
        assert_eq!(
            status_for(&ServiceError::Upstream("boom".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&ServiceError::NoDataForRange { missing: vec![] }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn storage_failures_are_internal() {
        assert_eq!(
            status_for(&ServiceError::Persistence("rollback".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
