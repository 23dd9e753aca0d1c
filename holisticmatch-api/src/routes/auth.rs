/// Authentication and account endpoints
///
/// # Endpoints
///
/// - `POST /api/v1/auth/login` - Exchange credentials for a session pair
/// - `POST /api/v1/auth/refresh` - New access token from a refresh token
/// - `GET  /api/v1/auth/me` - Current account's profile
/// - `POST /api/v1/auth/register` - Create an inactive account and its profile
/// - `POST /api/v1/auth/verify-email` - Activate with the emailed token
/// - `POST /api/v1/auth/resend-verification` - Mail a fresh verification link
/// - `POST /api/v1/auth/password-reset` - Mail a reset link
/// - `POST /api/v1/auth/password-reset-confirm` - Set a new password
///
/// Bodies are read as loose JSON: missing or mistyped string fields read as
/// empty and fail validation with a field-level message instead of a
/// deserialization error.

use super::{from_body, str_field, JsonBody, MessageResponse, ProfessionalDetail};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::AuthContext,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use holisticmatch_shared::services::authentication::LoginOutcome;
use holisticmatch_shared::validation::ProfileInput;
use serde::{Deserialize, Serialize};

const RESEND_ACCEPTED: &str = "Se o email estiver registrado, você receberá um link de verificação";
const RESET_REQUESTED: &str = "Se este email estiver cadastrado, você receberá um link de reset de senha";

/// Refresh response
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// New access token
    pub access: String,
}

/// Registration response; carries no session tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub professional: ProfessionalDetail,
    pub user_id: i64,
    pub professional_id: i64,
}

/// Verification response
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyEmailResponse {
    pub message: String,
    pub email: String,
}

/// Login
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/auth/login
/// Content-Type: application/json
///
/// { "email": "alice@example.com", "password": "Secret1A" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "access": "eyJ...",
///   "refresh": "eyJ...",
///   "user": { "id": 1, "email": "alice@example.com", "name": "Alice Ferreira" }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: email or password missing
/// - `401 Unauthorized`: unknown email or wrong password (indistinguishable)
/// - `403 Forbidden`: email not verified yet
pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> ApiResult<Json<LoginOutcome>> {
    let outcome = state
        .auth
        .login(str_field(&body, "email"), str_field(&body, "password"))
        .await?;

    Ok(Json(outcome))
}

/// Refresh access token
///
/// ```text
/// POST /api/v1/auth/refresh
/// { "refresh": "eyJ..." }
/// ```
///
/// Any signature, expiry or type problem is `401 Unauthorized`.
pub async fn refresh(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> ApiResult<Json<RefreshResponse>> {
    let access = state.auth.refresh(str_field(&body, "refresh")).await?;
    Ok(Json(RefreshResponse { access }))
}

/// Current account's profile
///
/// # Errors
///
/// - `401 Unauthorized`: missing or invalid bearer token
/// - `404 Not Found`: the account has no profile
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ProfessionalDetail>> {
    let current = state.auth.account_with_profile(auth.account_id).await?;
    Ok(Json(ProfessionalDetail::new(current.professional, &current.account)))
}

/// Register a professional
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/auth/register
/// Content-Type: application/json
///
/// {
///   "name": "Alice Ferreira",
///   "bio": "...",
///   "services": ["Reiki"],
///   "city": "Rio de Janeiro",
///   "state": "RJ",
///   "price_per_session": 150,
///   "attendance_type": "online",
///   "email": "alice@example.com",
///   "password": "Secret1A"
/// }
/// ```
///
/// The account stays inactive until the emailed link is used; no session
/// tokens are returned.
///
/// # Errors
///
/// - `400 Bad Request`: field validation failed or the email is taken
pub async fn register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let input: ProfileInput = from_body(&body)?;

    let registration = state
        .registration
        .register(&input, str_field(&body, "password"))
        .await?;

    let user_id = registration.account.id;
    let professional_id = registration.professional.id;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Profissional criado com sucesso. Verifique seu email para ativar a conta."
                .to_string(),
            professional: ProfessionalDetail::new(registration.professional, &registration.account),
            user_id,
            professional_id,
        }),
    ))
}

/// Consume an email verification token
///
/// Submitting an already used token again succeeds without side effects.
///
/// # Errors
///
/// - `400 Bad Request`: token missing, unknown or expired
pub async fn verify_email(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> ApiResult<Json<VerifyEmailResponse>> {
    let token = str_field(&body, "token").trim();
    if token.is_empty() {
        return Err(ApiError::field("token", "This field is required"));
    }

    let verified = state.registration.verify_email(token).await?;

    Ok(Json(VerifyEmailResponse {
        message: "Email verificado com sucesso!".to_string(),
        email: verified.email,
    }))
}

/// Re-send the verification email
///
/// Unknown emails get the same answer as a successful send.
///
/// # Errors
///
/// - `400 Bad Request`: malformed email, or the account is already active
pub async fn resend_verification(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> ApiResult<Json<MessageResponse>> {
    state
        .registration
        .resend_verification(str_field(&body, "email"))
        .await?;

    Ok(Json(MessageResponse::new(RESEND_ACCEPTED)))
}

/// Request a password reset link
///
/// Always answers the same way for well-formed emails.
pub async fn password_reset(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> ApiResult<Json<MessageResponse>> {
    state
        .registration
        .request_password_reset(str_field(&body, "email"))
        .await?;

    Ok(Json(MessageResponse::new(RESET_REQUESTED)))
}

/// Set a new password with a reset token
///
/// ```text
/// POST /api/v1/auth/password-reset-confirm
/// { "token": "...", "password": "NewPass2B", "password_confirm": "NewPass2B" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: token invalid, expired or already used; password
///   policy violation; confirmation mismatch
pub async fn password_reset_confirm(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> ApiResult<Json<MessageResponse>> {
    state
        .registration
        .confirm_password_reset(
            str_field(&body, "token"),
            str_field(&body, "password"),
            str_field(&body, "password_confirm"),
        )
        .await?;

    Ok(Json(MessageResponse::new("Senha atualizada com sucesso")))
}
