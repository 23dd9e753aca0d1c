/// Professional profile model and database operations
///
/// Each account owns at most one professional profile. The profile is the
/// public listing: services offered, location, price and contact details.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE attendance_type AS ENUM ('presencial', 'online', 'ambos');
///
/// CREATE TABLE professionals (
///     id BIGSERIAL PRIMARY KEY,
///     account_id BIGINT NOT NULL UNIQUE REFERENCES accounts(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     bio TEXT NOT NULL,
///     services TEXT[] NOT NULL DEFAULT '{}',
///     city VARCHAR(100) NOT NULL,
///     state VARCHAR(2) NOT NULL,
///     price_per_session NUMERIC(10, 2) NOT NULL,
///     attendance_type attendance_type NOT NULL DEFAULT 'presencial',
///     whatsapp VARCHAR(20),
///     email VARCHAR(254) NOT NULL,
///     phone VARCHAR(20),
///     photo_url VARCHAR(512),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Prices are `NUMERIC(10,2)` in the table and `f64` in Rust; queries cast on
/// the way in and out, and validation rounds to cents before writing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use std::fmt;
use std::str::FromStr;

/// How sessions are delivered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "attendance_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AttendanceType {
    /// In person
    #[default]
    Presencial,

    Online,

    /// Both in person and online
    Ambos,
}

impl AttendanceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceType::Presencial => "presencial",
            AttendanceType::Online => "online",
            AttendanceType::Ambos => "ambos",
        }
    }
}

impl fmt::Display for AttendanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceType {
    type Err = String;

    /// Case-insensitive parse
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "presencial" => Ok(AttendanceType::Presencial),
            "online" => Ok(AttendanceType::Online),
            "ambos" => Ok(AttendanceType::Ambos),
            other => Err(format!("Invalid attendance type: {}", other)),
        }
    }
}

/// Professional profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Professional {
    pub id: i64,

    /// Owning account (one-to-one)
    pub account_id: i64,

    pub name: String,
    pub bio: String,

    /// Names from the service catalogue
    pub services: Vec<String>,

    pub city: String,

    /// Two-letter state code, upper case
    pub state: String,

    pub price_per_session: f64,
    pub attendance_type: AttendanceType,

    /// Digits only
    pub whatsapp: Option<String>,

    /// Public contact email
    pub email: String,

    /// Digits only
    pub phone: Option<String>,

    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated fields for a new or updated profile
#[derive(Debug, Clone, PartialEq)]
pub struct ProfessionalFields {
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
}

/// Listing filters; `None` means "no constraint"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfessionalFilter {
    /// Case-insensitive substring of any offered service
    pub service: Option<String>,

    /// Case-insensitive substring of the city
    pub city: Option<String>,

    /// Case-insensitive exact state code
    pub state: Option<String>,

    /// Inclusive lower price bound
    pub price_min: Option<f64>,

    /// Inclusive upper price bound
    pub price_max: Option<f64>,

    pub attendance_type: Option<AttendanceType>,
}

impl ProfessionalFilter {
    /// In-memory evaluation of the same predicate the SQL listing applies
    pub fn matches(&self, professional: &Professional) -> bool {
        if let Some(service) = &self.service {
            let needle = service.to_lowercase();
            if !professional
                .services
                .iter()
                .any(|s| s.to_lowercase().contains(&needle))
            {
                return false;
            }
        }

        if let Some(city) = &self.city {
            if !professional.city.to_lowercase().contains(&city.to_lowercase()) {
                return false;
            }
        }

        if let Some(state) = &self.state {
            if !professional.state.eq_ignore_ascii_case(state.trim()) {
                return false;
            }
        }

        if let Some(min) = self.price_min {
            if professional.price_per_session < min {
                return false;
            }
        }

        if let Some(max) = self.price_max {
            if professional.price_per_session > max {
                return false;
            }
        }

        if let Some(attendance) = self.attendance_type {
            if professional.attendance_type != attendance {
                return false;
            }
        }

        true
    }
}

const PROFESSIONAL_COLUMNS: &str = "id, account_id, name, bio, services, city, state, \
     price_per_session::float8 AS price_per_session, attendance_type, whatsapp, email, phone, \
     photo_url, created_at, updated_at";

const FILTER_CLAUSE: &str = r#"
    ($1::text IS NULL OR EXISTS (
        SELECT 1 FROM unnest(services) AS s(name) WHERE s.name ILIKE '%' || $1 || '%' ESCAPE '\'))
    AND ($2::text IS NULL OR city ILIKE '%' || $2 || '%' ESCAPE '\')
    AND ($3::text IS NULL OR UPPER(state) = UPPER($3))
    AND ($4::float8 IS NULL OR price_per_session >= $4)
    AND ($5::float8 IS NULL OR price_per_session <= $5)
    AND ($6::attendance_type IS NULL OR attendance_type = $6)
"#;

/// Escapes `%`, `_` and `\` so user input matches literally inside ILIKE
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl Professional {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        account_id: i64,
        fields: &ProfessionalFields,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO professionals
                (account_id, name, bio, services, city, state, price_per_session,
                 attendance_type, whatsapp, email, phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7::numeric, $8, $9, $10, $11)
            RETURNING {}
            "#,
            PROFESSIONAL_COLUMNS
        );

        sqlx::query_as::<_, Professional>(&sql)
            .bind(account_id)
            .bind(&fields.name)
            .bind(&fields.bio)
            .bind(&fields.services)
            .bind(&fields.city)
            .bind(&fields.state)
            .bind(fields.price_per_session)
            .bind(fields.attendance_type)
            .bind(&fields.whatsapp)
            .bind(&fields.email)
            .bind(&fields.phone)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {} FROM professionals WHERE id = $1", PROFESSIONAL_COLUMNS);

        sqlx::query_as::<_, Professional>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_account<'e, E: PgExecutor<'e>>(
        executor: E,
        account_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM professionals WHERE account_id = $1",
            PROFESSIONAL_COLUMNS
        );

        sqlx::query_as::<_, Professional>(&sql)
            .bind(account_id)
            .fetch_optional(executor)
            .await
    }

    /// One page of matching profiles, newest first
    pub async fn list<'e, E: PgExecutor<'e>>(
        executor: E,
        filter: &ProfessionalFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM professionals WHERE {} ORDER BY created_at DESC, id DESC LIMIT $7 OFFSET $8",
            PROFESSIONAL_COLUMNS, FILTER_CLAUSE
        );

        sqlx::query_as::<_, Professional>(&sql)
            .bind(filter.service.as_deref().map(escape_like))
            .bind(filter.city.as_deref().map(escape_like))
            .bind(filter.state.as_deref().map(str::trim))
            .bind(filter.price_min)
            .bind(filter.price_max)
            .bind(filter.attendance_type)
            .bind(limit)
            .bind(offset)
            .fetch_all(executor)
            .await
    }

    pub async fn count<'e, E: PgExecutor<'e>>(
        executor: E,
        filter: &ProfessionalFilter,
    ) -> Result<i64, sqlx::Error> {
        let sql = format!("SELECT COUNT(*) FROM professionals WHERE {}", FILTER_CLAUSE);

        sqlx::query_scalar::<_, i64>(&sql)
            .bind(filter.service.as_deref().map(escape_like))
            .bind(filter.city.as_deref().map(escape_like))
            .bind(filter.state.as_deref().map(str::trim))
            .bind(filter.price_min)
            .bind(filter.price_max)
            .bind(filter.attendance_type)
            .fetch_one(executor)
            .await
    }

    /// Overwrites every editable field
    pub async fn update<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i64,
        fields: &ProfessionalFields,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE professionals
               SET name = $2, bio = $3, services = $4, city = $5, state = $6,
                   price_per_session = $7::numeric, attendance_type = $8,
                   whatsapp = $9, email = $10, phone = $11, updated_at = NOW()
             WHERE id = $1
            RETURNING {}
            "#,
            PROFESSIONAL_COLUMNS
        );

        sqlx::query_as::<_, Professional>(&sql)
            .bind(id)
            .bind(&fields.name)
            .bind(&fields.bio)
            .bind(&fields.services)
            .bind(&fields.city)
            .bind(&fields.state)
            .bind(fields.price_per_session)
            .bind(fields.attendance_type)
            .bind(&fields.whatsapp)
            .bind(&fields.email)
            .bind(&fields.phone)
            .fetch_optional(executor)
            .await
    }

    pub async fn set_photo_url<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i64,
        photo_url: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "UPDATE professionals SET photo_url = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            PROFESSIONAL_COLUMNS
        );

        sqlx::query_as::<_, Professional>(&sql)
            .bind(id)
            .bind(photo_url)
            .fetch_optional(executor)
            .await
    }

    /// Deletes the profile only; the owning account is untouched
    pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM professionals WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Fields in their editable form, for merging partial updates
    pub fn fields(&self) -> ProfessionalFields {
        ProfessionalFields {
            name: self.name.clone(),
            bio: self.bio.clone(),
            services: self.services.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            price_per_session: self.price_per_session,
            attendance_type: self.attendance_type,
            whatsapp: self.whatsapp.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Professional {
        Professional {
            id: 1,
            account_id: 1,
            name: "Maria Silva".to_string(),
            bio: "b".repeat(60),
            services: vec!["Reiki".to_string(), "Meditação Guiada".to_string()],
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
            price_per_session: 150.0,
            attendance_type: AttendanceType::Ambos,
            whatsapp: None,
            email: "maria@example.com".to_string(),
            phone: None,
            photo_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_attendance_type_parse() {
        assert_eq!("presencial".parse::<AttendanceType>().unwrap(), AttendanceType::Presencial);
        assert_eq!(" ONLINE ".parse::<AttendanceType>().unwrap(), AttendanceType::Online);
        assert_eq!("Ambos".parse::<AttendanceType>().unwrap(), AttendanceType::Ambos);
        assert!("remote".parse::<AttendanceType>().is_err());
        assert_eq!(AttendanceType::default(), AttendanceType::Presencial);
    }

    #[test]
    fn test_attendance_type_serde() {
        assert_eq!(serde_json::to_value(AttendanceType::Ambos).unwrap(), "ambos");
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(ProfessionalFilter::default().matches(&sample()));
    }

    #[test]
    fn test_filter_service_and_city_are_substring_case_insensitive() {
        let p = sample();

        let filter = ProfessionalFilter {
            service: Some("meditação".to_string()),
            city: Some("paulo".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&p));

        let filter = ProfessionalFilter {
            service: Some("yoga".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&p));
    }

    #[test]
    fn test_filter_state_is_exact() {
        let p = sample();

        let sp = ProfessionalFilter {
            state: Some("sp".to_string()),
            ..Default::default()
        };
        assert!(sp.matches(&p));

        let s = ProfessionalFilter {
            state: Some("S".to_string()),
            ..Default::default()
        };
        assert!(!s.matches(&p));
    }

    #[test]
    fn test_filter_price_bounds_are_inclusive() {
        let p = sample();

        let filter = ProfessionalFilter {
            price_min: Some(150.0),
            price_max: Some(150.0),
            ..Default::default()
        };
        assert!(filter.matches(&p));

        let filter = ProfessionalFilter {
            price_min: Some(150.01),
            ..Default::default()
        };
        assert!(!filter.matches(&p));
    }

    #[test]
    fn test_filter_attendance_type() {
        let p = sample();

        let filter = ProfessionalFilter {
            attendance_type: Some(AttendanceType::Online),
            ..Default::default()
        };
        assert!(!filter.matches(&p));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("Reiki"), "Reiki");
    }
}
