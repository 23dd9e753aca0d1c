/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Login, sessions, registration and account recovery
/// - `professionals`: Listing, profile edits and photo upload
/// - `reference`: Service catalogue and city directory

pub mod auth;
pub mod health;
pub mod professionals;
pub mod reference;

use crate::error::{ApiError, ApiResult};
use axum::{extract::FromRequest, Json};
use chrono::{DateTime, Utc};
use holisticmatch_shared::models::{account::Account, professional::{AttendanceType, Professional}};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Success body of the account flows
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Owner reference embedded in a profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRef {
    pub id: i64,
    pub email: String,
}

/// Full profile as returned by detail, update, registration and `/auth/me`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfessionalDetail {
    pub id: i64,
    pub user: UserRef,
    pub name: String,
    pub bio: String,
    pub services: Vec<String>,
    pub city: String,
    pub state: String,
    pub price_per_session: f64,
    pub attendance_type: AttendanceType,
    pub whatsapp: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfessionalDetail {
    pub fn new(professional: Professional, account: &Account) -> Self {
        Self {
            id: professional.id,
            user: UserRef {
                id: account.id,
                email: account.email.clone(),
            },
            name: professional.name,
            bio: professional.bio,
            services: professional.services,
            city: professional.city,
            state: professional.state,
            price_per_session: professional.price_per_session,
            attendance_type: professional.attendance_type,
            whatsapp: professional.whatsapp,
            email: professional.email,
            phone: professional.phone,
            photo_url: professional.photo_url,
            created_at: professional.created_at,
            updated_at: professional.updated_at,
        }
    }
}

/// Loose JSON request body
///
/// A missing, non-JSON or unparsable body is a `400` with the usual error
/// body instead of axum's plain-text rejection.
#[derive(Debug, Deserialize, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct JsonBody(pub Value);

/// Reads one typed view out of a JSON body
pub(crate) fn from_body<T: DeserializeOwned>(body: &Value) -> ApiResult<T> {
    T::deserialize(body).map_err(|e| ApiError::BadRequest(format!("Malformed request body: {}", e)))
}

/// String field of a JSON body; absent, null or non-string reads as empty
pub(crate) fn str_field<'a>(body: &'a Value, name: &str) -> &'a str {
    body.get(name).and_then(Value::as_str).unwrap_or_default()
}
