use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use grid_wars_domain::ServiceError;
use serde::Serialize;
use validator::ValidationErrors;

/// Uniform body wrapper shared by every endpoint, success and failure alike.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub message: String,
    pub error: bool,
    pub timestamp: String,
    pub path: String,
    pub status: u16,
}

pub fn success<T: Serialize>(
    status: StatusCode,
    data: Option<T>,
    message: &str,
    path: &str,
) -> Response {
    let body = ApiResponse {
        data,
        message: message.to_string(),
        error: false,
        timestamp: chrono::Utc::now().to_rfc3339(),
        path: path.to_string(),
        status: status.as_u16(),
    };
    (status, Json(body)).into_response()
}

#[derive(Debug)]
pub struct ApiError {
    error: ServiceError,
    path: String,
}

impl ApiError {
    pub fn new(error: ServiceError, path: String) -> Self {
        Self { error, path }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.error {
            ServiceError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ServiceError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ServiceError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ServiceError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ServiceError::Internal(msg) => {
                log::error!("Internal error on {}: {msg}", self.path);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        let body = ApiResponse::<()> {
            data: None,
            message,
            error: true,
            timestamp: chrono::Utc::now().to_rfc3339(),
            path: self.path,
            status: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

/// Picks the first human-readable message out of a failed validation run.
pub fn first_validation_message(errors: &ValidationErrors) -> String {
    for (field, kinds) in errors.field_errors() {
        if let Some(error) = kinds.first() {
            return match &error.message {
                Some(msg) => msg.to_string(),
                None => format!("{field} is invalid"),
            };
        }
    }
    "Validation failed".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Dto {
        #[validate(length(min = 3, message = "name must be at least 3 characters"))]
        name: String,
    }

    #[test]
    fn test_first_validation_message() {
        let dto = Dto {
            name: "ab".to_string(),
        };
        let errors = dto.validate().unwrap_err();
        assert_eq!(
            first_validation_message(&errors),
            "name must be at least 3 characters"
        );
    }

    #[test]
    fn test_envelope_shape() {
        let response = ApiResponse {
            data: Some(serde_json::json!({"id": 1})),
            message: "ok".to_string(),
            error: false,
            timestamp: chrono::Utc::now().to_rfc3339(),
            path: "/test".to_string(),
            status: 200,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["error"], serde_json::json!(false));
        assert_eq!(value["status"], serde_json::json!(200));
        assert_eq!(value["data"]["id"], serde_json::json!(1));
        assert!(value.get("timestamp").is_some());
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ServiceError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ServiceError::Conflict("x".into()), StatusCode::CONFLICT),
            (ServiceError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (
                ServiceError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, expected) in cases {
            let response = ApiError::new(error, "/test".to_string()).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
