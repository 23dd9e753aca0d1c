/// Error handling for the API server
///
/// All handlers return `Result<T, ApiError>`; service errors convert with `?`
/// into the status codes below.
///
/// | Service error | Status |
/// |---|---|
/// | validation failures, email taken | 400 with `details` |
/// | invalid/expired/used one-time token | 400 |
/// | invalid credentials, bad session token | 401 |
/// | account not activated, foreign profile | 403 |
/// | profile missing, unknown id, page past the end | 404 |
/// | store, hashing, transport | 500, detail logged only |
///
/// # Example
///
/// ```
/// use holisticmatch_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler(found: bool) -> ApiResult<Json<Value>> {
///     if !found {
///         return Err(ApiError::NotFound("Professional not found".to_string()));
///     }
///     Ok(Json(json!({ "ok": true })))
/// }
/// ```

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use holisticmatch_shared::services::{
    photos::PhotoStorageError, AuthError, LedgerError, ProfessionalError, RegistrationError,
};
use holisticmatch_shared::store::StoreError;
use holisticmatch_shared::validation::FieldErrors;
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Field validation errors (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Payload too large (413)
    PayloadTooLarge(String),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Single-field validation failure
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: field.to_string(),
            message: message.into(),
        }])
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (error_code, message, details) = match self {
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::Unauthorized(msg) => ("unauthorized", msg, None),
            ApiError::Forbidden(msg) => ("forbidden", msg, None),
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::ValidationError(errors) => (
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::PayloadTooLarge(msg) => ("payload_too_large", msg, None),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError::ValidationError(
            errors
                .into_vec()
                .into_iter()
                .map(|e| ValidationErrorDetail {
                    field: e.field,
                    message: e.message,
                })
                .collect(),
        )
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::InternalError(format!("Store error: {}", err))
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound => ApiError::BadRequest("Invalid token".to_string()),
            LedgerError::Expired => {
                ApiError::BadRequest("Token expired. Request a new verification email.".to_string())
            }
            LedgerError::InvalidOrExpired => {
                ApiError::BadRequest("Token is invalid, expired or already used".to_string())
            }
            LedgerError::Password(e) => ApiError::InternalError(format!("Password operation failed: {}", e)),
            LedgerError::Store(e) => e.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingFields => ApiError::BadRequest(err.to_string()),
            AuthError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            AuthError::NotActivated => ApiError::Forbidden(err.to_string()),
            AuthError::InvalidToken => ApiError::Unauthorized(err.to_string()),
            AuthError::Unauthenticated => ApiError::Unauthorized(err.to_string()),
            AuthError::ProfileMissing => ApiError::NotFound(err.to_string()),
            AuthError::Password(e) => ApiError::InternalError(format!("Password operation failed: {}", e)),
            AuthError::Jwt(e) => ApiError::InternalError(format!("Token creation failed: {}", e)),
            AuthError::Store(e) => e.into(),
        }
    }
}

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::Validation(errors) => errors.into(),
            RegistrationError::EmailTaken => ApiError::field("email", err.to_string()),
            RegistrationError::AlreadyActive => ApiError::field("email", err.to_string()),
            RegistrationError::Ledger(e) => e.into(),
            RegistrationError::Password(e) => ApiError::InternalError(format!("Password operation failed: {}", e)),
            RegistrationError::Store(e) => e.into(),
        }
    }
}

impl From<PhotoStorageError> for ApiError {
    fn from(err: PhotoStorageError) -> Self {
        match err {
            PhotoStorageError::UnsupportedType(_) => {
                ApiError::field("photo", "Only JPEG and PNG images are accepted")
            }
            PhotoStorageError::Empty => ApiError::field("photo", err.to_string()),
            PhotoStorageError::TooLarge { .. } => {
                ApiError::PayloadTooLarge("Photo must be at most 5MB".to_string())
            }
            PhotoStorageError::Io(e) => ApiError::InternalError(format!("Photo storage failed: {}", e)),
        }
    }
}

impl From<ProfessionalError> for ApiError {
    fn from(err: ProfessionalError) -> Self {
        match err {
            ProfessionalError::NotFound => ApiError::NotFound(err.to_string()),
            ProfessionalError::Forbidden => ApiError::Forbidden(err.to_string()),
            ProfessionalError::PageNotFound => ApiError::NotFound(err.to_string()),
            ProfessionalError::Validation(errors) => errors.into(),
            ProfessionalError::Photo(e) => e.into(),
            ProfessionalError::Store(e) => e.into(),
        }
    }
}
