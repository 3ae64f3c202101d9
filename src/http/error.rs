use crate::error::KinshipError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

/// Error carried out of a handler as an HTTP response with a `{ "error" }` body
#[derive(Debug)]
pub enum ApiError {
    Engine(KinshipError),
    /// Request body the extractor could not accept
    InvalidBody { status: StatusCode, message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        let err = match self {
            ApiError::Engine(err) => err,
            ApiError::InvalidBody { status, .. } => return *status,
        };

        match err {
            KinshipError::PersonNotFound(_) => StatusCode::NOT_FOUND,
            KinshipError::TraversalLimitExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            KinshipError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            KinshipError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            KinshipError::Store(_) => StatusCode::BAD_GATEWAY,
            KinshipError::TaskFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<KinshipError> for ApiError {
    fn from(err: KinshipError) -> Self {
        Self::Engine(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Engine(err) => err.to_string(),
            ApiError::InvalidBody { message, .. } => message,
        };

        if status.is_server_error() {
            error!("Request failed ({}): {}", status, message);
        } else {
            warn!("Request rejected ({}): {}", status, message);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (KinshipError::PersonNotFound("A".to_string()), StatusCode::NOT_FOUND),
            (KinshipError::TraversalLimitExceeded { limit: 10 }, StatusCode::UNPROCESSABLE_ENTITY),
            (KinshipError::Timeout { seconds: 30 }, StatusCode::GATEWAY_TIMEOUT),
            (KinshipError::Cancelled, StatusCode::SERVICE_UNAVAILABLE),
            (
                KinshipError::Store(StoreError::Unavailable("down".to_string())),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }
}
