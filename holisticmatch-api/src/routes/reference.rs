/// Reference data endpoints
///
/// - `GET /api/v1/service-types` - Service catalogue
/// - `GET /api/v1/cities/:state` - Cities of a state, sorted

use crate::error::{ApiError, ApiResult};
use axum::{extract::Path, Json};
use holisticmatch_shared::catalog::{self, SERVICE_TYPES, STATE_CODES};
use serde::{Deserialize, Serialize};

/// City directory response
#[derive(Debug, Serialize, Deserialize)]
pub struct CitiesResponse {
    pub state: String,
    pub cities: Vec<String>,
    pub count: usize,
}

pub async fn service_types() -> Json<Vec<&'static str>> {
    Json(SERVICE_TYPES.to_vec())
}

/// Cities for a two-letter state code (case-insensitive)
///
/// # Errors
///
/// - `400 Bad Request`: not a Brazilian state code
/// - `404 Not Found`: the state has no cities in the directory
pub async fn cities(Path(state): Path<String>) -> ApiResult<Json<CitiesResponse>> {
    if state.chars().count() != 2 {
        return Err(ApiError::BadRequest(
            "State code must be 2 characters (e.g., SP, RJ)".to_string(),
        ));
    }

    let code = catalog::normalize_state(&state).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "Invalid state code: {}. Valid codes: {}",
            state,
            STATE_CODES.join(", ")
        ))
    })?;

    let cities = catalog::cities_for_state(code);
    if cities.is_empty() {
        return Err(ApiError::NotFound(format!("No cities found for state: {}", code)));
    }

    Ok(Json(CitiesResponse {
        state: code.to_string(),
        count: cities.len(),
        cities: cities.into_iter().map(str::to_string).collect(),
    }))
}
