/// Professional listing and profile endpoints
///
/// # Endpoints
///
/// - `GET    /api/v1/professionals` - Filtered, paginated listing (public)
/// - `GET    /api/v1/professionals/:id` - Profile detail (public)
/// - `PUT    /api/v1/professionals/:id` - Full update (owner)
/// - `PATCH  /api/v1/professionals/:id` - Partial update (owner)
/// - `DELETE /api/v1/professionals/:id` - Remove the profile, keep the account (owner)
/// - `POST   /api/v1/professionals/:id/photo` - Multipart photo upload (owner)

use super::{from_body, JsonBody, ProfessionalDetail};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::AuthContext,
};
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use holisticmatch_shared::models::professional::{AttendanceType, Professional, ProfessionalFilter};
use holisticmatch_shared::services::professionals::{Page, ProfessionalSummary};
use holisticmatch_shared::validation::{FieldErrors, ProfileInput};
use serde::{Deserialize, Serialize};

const PHOTO_FIELD: &str = "photo";

/// Listing query string; every value arrives as text
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub service: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub price_min: Option<String>,
    pub price_max: Option<String>,
    pub attendance_type: Option<String>,
    pub page: Option<String>,
}

/// Blank parameters are treated as absent
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ListQuery {
    /// Parses the filters; malformed numbers or attendance types are field errors
    pub fn filter(&self) -> Result<ProfessionalFilter, FieldErrors> {
        let mut errors = FieldErrors::new();

        let mut price = |field: &str, value: &Option<String>| -> Option<f64> {
            let raw = present(value)?;
            match raw.parse::<f64>() {
                Ok(v) if v.is_finite() => Some(v),
                _ => {
                    errors.add(field, "Enter a number.");
                    None
                }
            }
        };
        let price_min = price("price_min", &self.price_min);
        let price_max = price("price_max", &self.price_max);

        let attendance_type = present(&self.attendance_type).and_then(|raw| {
            raw.parse::<AttendanceType>()
                .map_err(|_| errors.add("attendance_type", "Select a valid choice: presencial, online or ambos."))
                .ok()
        });

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ProfessionalFilter {
            service: present(&self.service).map(str::to_string),
            city: present(&self.city).map(str::to_string),
            state: present(&self.state).map(str::to_string),
            price_min,
            price_max,
            attendance_type,
        })
    }

    /// 1-based page; anything unparsable is a missing page
    pub fn page(&self) -> ApiResult<u32> {
        match present(&self.page) {
            None => Ok(1),
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| ApiError::NotFound("Invalid page".to_string())),
        }
    }
}

/// Photo upload response
#[derive(Debug, Serialize, Deserialize)]
pub struct PhotoResponse {
    pub message: String,
    pub photo_url: Option<String>,
}

async fn detail(state: &AppState, professional: Professional) -> ApiResult<ProfessionalDetail> {
    let account = state
        .store
        .find_account(professional.account_id)
        .await?
        .ok_or_else(|| {
            ApiError::InternalError(format!(
                "Professional {} has no account {}",
                professional.id, professional.account_id
            ))
        })?;

    Ok(ProfessionalDetail::new(professional, &account))
}

/// Filtered listing, newest first
///
/// # Query Parameters
///
/// - `service`, `city`: case-insensitive substring
/// - `state`, `attendance_type`: case-insensitive exact
/// - `price_min`, `price_max`: inclusive bounds
/// - `page`: 1-based
///
/// # Response
///
/// ```json
/// { "count": 25, "next": 2, "previous": null, "results": [ ... ] }
/// ```
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Page<ProfessionalSummary>>> {
    let filter = query.filter()?;
    let page = query.page()?;

    Ok(Json(state.professionals.list(&filter, page).await?))
}

/// Profile detail with its owner reference
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ProfessionalDetail>> {
    let professional = state.professionals.get(id).await?;
    Ok(Json(detail(&state, professional).await?))
}

/// Full update; every mandatory field must be sent
pub async fn replace(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    JsonBody(body): JsonBody,
) -> ApiResult<Json<ProfessionalDetail>> {
    let input: ProfileInput = from_body(&body)?;
    let updated = state
        .professionals
        .update(auth.account_id, id, &input, false)
        .await?;

    Ok(Json(detail(&state, updated).await?))
}

/// Partial update; absent fields keep their values
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    JsonBody(body): JsonBody,
) -> ApiResult<Json<ProfessionalDetail>> {
    let input: ProfileInput = from_body(&body)?;
    let updated = state
        .professionals
        .update(auth.account_id, id, &input, true)
        .await?;

    Ok(Json(detail(&state, updated).await?))
}

/// Deletes the profile and its photo; the account remains
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.professionals.delete(auth.account_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("Photo must be at most 5MB".to_string())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

/// Multipart upload of the `photo` field (JPEG or PNG, at most 5 MiB)
///
/// # Errors
///
/// - `400 Bad Request`: no `photo` field, empty file or unsupported type
/// - `401` / `403` / `404`: as for updates
/// - `413 Payload Too Large`: file over 5 MiB
pub async fn upload_photo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> ApiResult<Json<PhotoResponse>> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await.map_err(multipart_error)?;

        let updated = state
            .professionals
            .upload_photo(auth.account_id, id, data, &content_type)
            .await?;

        return Ok(Json(PhotoResponse {
            message: "Foto enviada com sucesso".to_string(),
            photo_url: updated.photo_url,
        }));
    }

    Err(ApiError::field(PHOTO_FIELD, "No photo provided"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    #[test]
    fn test_filter_parses_values() {
        let filter = ListQuery {
            service: text("reiki"),
            city: text(""),
            price_min: text("50"),
            price_max: text("200.5"),
            attendance_type: text("ONLINE"),
            ..Default::default()
        }
        .filter()
        .unwrap();

        assert_eq!(filter.service.as_deref(), Some("reiki"));
        assert_eq!(filter.city, None);
        assert_eq!(filter.price_min, Some(50.0));
        assert_eq!(filter.price_max, Some(200.5));
        assert_eq!(filter.attendance_type, Some(AttendanceType::Online));
    }

    #[test]
    fn test_filter_reports_bad_values() {
        let errors = ListQuery {
            price_min: text("cheap"),
            attendance_type: text("remote"),
            ..Default::default()
        }
        .filter()
        .unwrap_err();

        assert!(errors.has("price_min"));
        assert!(errors.has("attendance_type"));
    }

    #[test]
    fn test_page() {
        let page = |value: &str| ListQuery { page: text(value), ..Default::default() }.page();

        assert_eq!(ListQuery::default().page().unwrap(), 1);
        assert_eq!(page(" ").unwrap(), 1);
        assert_eq!(page("3").unwrap(), 3);
        assert!(matches!(page("last"), Err(ApiError::NotFound(_))));
    }
}
