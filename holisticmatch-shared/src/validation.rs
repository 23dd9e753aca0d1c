/// Profile field validation
///
/// Every rule runs and all failures are reported together, keyed by field,
/// so a client can mark every bad input in one round trip.
///
/// # Rules
///
/// | Field | Rule |
/// |---|---|
/// | `name` | 3..=255 chars, letters (accented included), spaces, `'` and `-` |
/// | `bio` | trimmed length >= 50, total <= 2000 |
/// | `services` | 1..=10 catalogue entries, no duplicates |
/// | `price_per_session` | 10.00 ..= 5000.00, rounded to cents |
/// | `state` | Brazilian UF, normalized to upper case |
/// | `city` | must be in the state's directory when the state has one |
/// | `phone`, `whatsapp` | optional Brazilian numbers, must differ |
/// | `email` | valid address |
///
/// # Example
///
/// ```
/// use holisticmatch_shared::validation::{validate_profile, PriceValue, ProfileInput};
///
/// let input = ProfileInput {
///     name: Some("Maria Silva".to_string()),
///     bio: Some("Terapeuta holística com mais de dez anos de experiência em Reiki.".to_string()),
///     services: Some(vec!["Reiki".to_string()]),
///     city: Some("São Paulo".to_string()),
///     state: Some("sp".to_string()),
///     price_per_session: Some(PriceValue::Number(150.0)),
///     email: Some("maria@example.com".to_string()),
///     ..Default::default()
/// };
///
/// let fields = validate_profile(&input).unwrap();
/// assert_eq!(fields.state, "SP");
/// ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use validator::ValidateEmail;

use crate::catalog;
use crate::models::account::normalize_email;
use crate::models::professional::{AttendanceType, ProfessionalFields};

pub const NAME_MIN_CHARS: usize = 3;
pub const NAME_MAX_CHARS: usize = 255;
pub const BIO_MIN_CHARS: usize = 50;
pub const BIO_MAX_CHARS: usize = 2000;
pub const MAX_SERVICES: usize = 10;
pub const PRICE_MIN: f64 = 10.0;
pub const PRICE_MAX: f64 = 5000.0;

const REQUIRED: &str = "This field is required";

/// One failed rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All failed rules of one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single-field failure
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<FieldError> {
        self.0
    }

    /// Appends every error of `other`
    pub fn extend(&mut self, other: FieldErrors) {
        self.0.extend(other.0);
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.iter().map(|e| e.field.as_str()).collect();
        write!(f, "validation failed for: {}", fields.join(", "))
    }
}

impl std::error::Error for FieldErrors {}

/// Price as sent by clients: JSON number or decimal string (`"150.00"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceValue {
    Number(f64),
    Text(String),
}

impl PriceValue {
    fn parse(&self) -> Option<f64> {
        match self {
            PriceValue::Number(n) => Some(*n),
            PriceValue::Text(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        }
        .filter(|n| n.is_finite())
    }
}

/// Raw profile fields as received
///
/// Every field is optional at this level: registration and full updates
/// require the mandatory ones, partial updates merge onto the stored profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileInput {
    #[serde(default, alias = "full_name")]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub services: Option<Vec<String>>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub price_per_session: Option<PriceValue>,
    #[serde(default)]
    pub attendance_type: Option<String>,
    #[serde(default)]
    pub whatsapp: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl ProfileInput {
    /// Fills every absent field from `current`
    pub fn merged_over(&self, current: &ProfessionalFields) -> ProfileInput {
        ProfileInput {
            name: self.name.clone().or_else(|| Some(current.name.clone())),
            bio: self.bio.clone().or_else(|| Some(current.bio.clone())),
            services: self.services.clone().or_else(|| Some(current.services.clone())),
            city: self.city.clone().or_else(|| Some(current.city.clone())),
            state: self.state.clone().or_else(|| Some(current.state.clone())),
            price_per_session: self
                .price_per_session
                .clone()
                .or(Some(PriceValue::Number(current.price_per_session))),
            attendance_type: self
                .attendance_type
                .clone()
                .or_else(|| Some(current.attendance_type.as_str().to_string())),
            whatsapp: self.whatsapp.clone().or_else(|| current.whatsapp.clone()),
            email: self.email.clone().or_else(|| Some(current.email.clone())),
            phone: self.phone.clone().or_else(|| current.phone.clone()),
        }
    }

    /// Errors for every mandatory field that is absent
    pub fn missing_required(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        let checks = [
            ("name", self.name.is_none()),
            ("bio", self.bio.is_none()),
            ("services", self.services.is_none()),
            ("city", self.city.is_none()),
            ("state", self.state.is_none()),
            ("price_per_session", self.price_per_session.is_none()),
            ("email", self.email.is_none()),
        ];

        for (field, missing) in checks {
            if missing {
                errors.add(field, REQUIRED);
            }
        }

        errors
    }
}

/// Validates and normalizes a complete profile
///
/// # Errors
///
/// Every failed rule, including absent mandatory fields
pub fn validate_profile(input: &ProfileInput) -> Result<ProfessionalFields, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = required(&mut errors, "name", input.name.as_deref())
        .and_then(|v| check(&mut errors, "name", validate_name(v)));
    let bio = required(&mut errors, "bio", input.bio.as_deref())
        .and_then(|v| check(&mut errors, "bio", validate_bio(v)));
    let services = match &input.services {
        Some(list) => check(&mut errors, "services", validate_services(list)),
        None => {
            errors.add("services", REQUIRED);
            None
        }
    };
    let state = required(&mut errors, "state", input.state.as_deref())
        .and_then(|v| check(&mut errors, "state", validate_state(v)));
    let city = required(&mut errors, "city", input.city.as_deref()).and_then(|v| match state {
        Some(state) => check(&mut errors, "city", validate_city(state, v)),
        None => Some(v.trim().to_string()),
    });
    let price = match &input.price_per_session {
        Some(value) => check(&mut errors, "price_per_session", validate_price(value)),
        None => {
            errors.add("price_per_session", REQUIRED);
            None
        }
    };
    let attendance_type = match input.attendance_type.as_deref().map(str::trim) {
        None | Some("") => Some(AttendanceType::default()),
        Some(v) => check(
            &mut errors,
            "attendance_type",
            v.parse::<AttendanceType>()
                .map_err(|_| "Attendance type must be one of: presencial, online, ambos".to_string()),
        ),
    };
    let email = required(&mut errors, "email", input.email.as_deref())
        .and_then(|v| check(&mut errors, "email", validate_email(v)));
    let phone = optional_phone(&mut errors, "phone", input.phone.as_deref());
    let whatsapp = optional_phone(&mut errors, "whatsapp", input.whatsapp.as_deref());

    if let (Some(Some(w)), Some(Some(p))) = (&whatsapp, &phone) {
        if w == p {
            errors.add("whatsapp", "WhatsApp and phone must be different numbers");
        }
    }

    match (name, bio, services, city, state, price, attendance_type, email, phone, whatsapp) {
        (
            Some(name),
            Some(bio),
            Some(services),
            Some(city),
            Some(state),
            Some(price_per_session),
            Some(attendance_type),
            Some(email),
            Some(phone),
            Some(whatsapp),
        ) if errors.is_empty() => Ok(ProfessionalFields {
            name,
            bio,
            services,
            city,
            state: state.to_string(),
            price_per_session,
            attendance_type,
            whatsapp,
            email,
            phone,
        }),
        _ => Err(errors),
    }
}

fn required<'a>(errors: &mut FieldErrors, field: &str, value: Option<&'a str>) -> Option<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v),
        _ => {
            errors.add(field, REQUIRED);
            None
        }
    }
}

fn check<T>(errors: &mut FieldErrors, field: &str, result: Result<T, String>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(message) => {
            errors.add(field, message);
            None
        }
    }
}

/// Outer `None` means the value was rejected; inner `None` means "not given"
fn optional_phone(errors: &mut FieldErrors, field: &str, value: Option<&str>) -> Option<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Some(None),
        Some(v) => check(errors, field, normalize_phone(v)).map(Some),
    }
}

pub fn validate_name(value: &str) -> Result<String, String> {
    let trimmed = value.trim();

    if trimmed.chars().count() < NAME_MIN_CHARS {
        return Err("Name must be at least 3 characters long".to_string());
    }

    if value.chars().count() > NAME_MAX_CHARS {
        return Err("Name must be at most 255 characters long".to_string());
    }

    let allowed = |c: char| {
        c.is_ascii_alphabetic() || ('\u{C0}'..='\u{FF}').contains(&c) || c.is_whitespace() || c == '\'' || c == '-'
    };
    if !value.chars().all(allowed) {
        return Err("Name may only contain letters, spaces, apostrophes and hyphens".to_string());
    }

    Ok(trimmed.to_string())
}

pub fn validate_bio(value: &str) -> Result<String, String> {
    if value.trim().chars().count() < BIO_MIN_CHARS {
        return Err("Bio must be at least 50 characters long".to_string());
    }

    if value.chars().count() > BIO_MAX_CHARS {
        return Err("Bio must be at most 2000 characters long".to_string());
    }

    Ok(value.trim().to_string())
}

pub fn validate_services(services: &[String]) -> Result<Vec<String>, String> {
    if services.is_empty() {
        return Err("Select at least one service".to_string());
    }

    if services.len() > MAX_SERVICES {
        return Err("At most 10 services are allowed".to_string());
    }

    let invalid: Vec<&str> = services
        .iter()
        .map(String::as_str)
        .filter(|s| !catalog::is_service_type(s))
        .collect();
    if !invalid.is_empty() {
        return Err(format!(
            "Invalid services: {}. Allowed services: {}",
            invalid.join(", "),
            catalog::SERVICE_TYPES.join(", ")
        ));
    }

    let unique: HashSet<&String> = services.iter().collect();
    if unique.len() != services.len() {
        return Err("Services must not contain duplicates".to_string());
    }

    Ok(services.to_vec())
}

pub fn validate_price(value: &PriceValue) -> Result<f64, String> {
    let price = value
        .parse()
        .ok_or_else(|| "Price must be a decimal number".to_string())?;

    if price <= 0.0 {
        return Err("Price must be greater than zero".to_string());
    }

    if price > PRICE_MAX {
        return Err("Price must be at most R$ 5.000,00".to_string());
    }

    if price < PRICE_MIN {
        return Err("Price must be at least R$ 10,00".to_string());
    }

    Ok((price * 100.0).round() / 100.0)
}

pub fn validate_state(value: &str) -> Result<&'static str, String> {
    if value.trim().chars().count() != 2 {
        return Err("State must have exactly 2 letters".to_string());
    }

    catalog::normalize_state(value).ok_or_else(|| {
        format!(
            "Invalid state. Valid states: {}",
            catalog::STATE_CODES.join(", ")
        )
    })
}

/// States with a city directory only accept listed cities (canonical spelling
/// is returned); other states accept any non-empty city
pub fn validate_city(state: &str, city: &str) -> Result<String, String> {
    let trimmed = city.trim();

    if trimmed.chars().count() > 100 {
        return Err("City must be at most 100 characters long".to_string());
    }

    if !catalog::has_city_directory(state) {
        return Ok(trimmed.to_string());
    }

    catalog::find_city(state, trimmed)
        .map(str::to_string)
        .ok_or_else(|| format!("City '{}' is not listed for state {}", trimmed, state))
}

pub fn validate_email(value: &str) -> Result<String, String> {
    let email = normalize_email(value);

    if email.chars().count() > 254 || !email.validate_email() {
        return Err("Enter a valid email address".to_string());
    }

    Ok(email)
}

/// Normalizes a Brazilian phone number to its digits
///
/// Accepts `(11) 99999-9999`, `11999999999`, `+55 11 99999-9999`. A `55`
/// country prefix is dropped from 13-digit numbers. Landlines have 10
/// digits, mobiles 11 with a leading 9 after the area code.
pub fn normalize_phone(value: &str) -> Result<String, String> {
    let mut digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() == 13 && digits.starts_with("55") {
        digits = digits.split_off(2);
    }

    let bytes = digits.as_bytes();
    let area_code_ok = |b: &[u8]| b[0] != b'0' && b[1] != b'0';

    match bytes.len() {
        10 if area_code_ok(bytes) => Ok(digits),
        10 => Err("Landline must be a valid Brazilian number, e.g. (11) 3333-4444".to_string()),
        11 if area_code_ok(bytes) && bytes[2] == b'9' => Ok(digits),
        11 => Err("Mobile must be a valid Brazilian number, e.g. (11) 99999-9999".to_string()),
        _ => Err("Phone must have 10 digits (landline) or 11 digits (mobile)".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> ProfileInput {
        ProfileInput {
            name: Some("Maria da Silva".to_string()),
            bio: Some("Terapeuta holística com mais de dez anos de experiência em Reiki e meditação.".to_string()),
            services: Some(vec!["Reiki".to_string(), "Meditação Guiada".to_string()]),
            city: Some("são paulo".to_string()),
            state: Some("sp".to_string()),
            price_per_session: Some(PriceValue::Text("150.00".to_string())),
            attendance_type: Some("Ambos".to_string()),
            whatsapp: Some("(11) 99999-8888".to_string()),
            email: Some(" Maria@Example.com ".to_string()),
            phone: Some("+55 11 3333-4444".to_string()),
        }
    }

    #[test]
    fn test_valid_profile_is_normalized() {
        let fields = validate_profile(&valid_input()).unwrap();

        assert_eq!(fields.name, "Maria da Silva");
        assert_eq!(fields.city, "São Paulo");
        assert_eq!(fields.state, "SP");
        assert_eq!(fields.price_per_session, 150.0);
        assert_eq!(fields.attendance_type, AttendanceType::Ambos);
        assert_eq!(fields.whatsapp.as_deref(), Some("11999998888"));
        assert_eq!(fields.phone.as_deref(), Some("1133334444"));
        assert_eq!(fields.email, "maria@example.com");
    }

    #[test]
    fn test_attendance_type_defaults_to_presencial() {
        let input = ProfileInput {
            attendance_type: None,
            ..valid_input()
        };
        assert_eq!(validate_profile(&input).unwrap().attendance_type, AttendanceType::Presencial);
    }

    #[test]
    fn test_all_errors_are_reported_together() {
        let input = ProfileInput {
            name: Some("Al".to_string()),
            bio: Some("short".to_string()),
            services: Some(vec![]),
            price_per_session: Some(PriceValue::Number(5.0)),
            ..valid_input()
        };

        let errors = validate_profile(&input).unwrap_err();
        assert!(errors.has("name"));
        assert!(errors.has("bio"));
        assert!(errors.has("services"));
        assert!(errors.has("price_per_session"));
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_missing_fields_are_required() {
        let errors = validate_profile(&ProfileInput::default()).unwrap_err();

        for field in ["name", "bio", "services", "city", "state", "price_per_session", "email"] {
            assert!(errors.has(field), "{} should be required", field);
        }
        assert!(!errors.has("phone"));
        assert_eq!(ProfileInput::default().missing_required().len(), 7);
    }

    #[test]
    fn test_name_rules() {
        assert!(validate_name("José D'Ávila-Souza").is_ok());
        assert!(validate_name("  Jo  ").is_err());
        assert!(validate_name("R2D2 Robot").is_err());
        assert!(validate_name(&"a".repeat(256)).is_err());
    }

    #[test]
    fn test_bio_counts_trimmed_characters() {
        let padded = format!("   {}   ", "x".repeat(49));
        assert!(validate_bio(&padded).is_err());
        assert!(validate_bio(&"x".repeat(50)).is_ok());
        assert!(validate_bio(&"x".repeat(2001)).is_err());
    }

    #[test]
    fn test_service_rules() {
        let many: Vec<String> = crate::catalog::SERVICE_TYPES.iter().map(|s| s.to_string()).collect();
        assert!(validate_services(&many).is_err());
        assert!(validate_services(&many[..10]).is_ok());

        let dup = vec!["Yoga".to_string(), "Yoga".to_string()];
        assert!(validate_services(&dup).unwrap_err().contains("duplicates"));

        let unknown = vec!["Astrologia".to_string()];
        assert!(validate_services(&unknown).unwrap_err().contains("Astrologia"));
    }

    #[test]
    fn test_price_rules() {
        assert_eq!(validate_price(&PriceValue::Number(10.0)).unwrap(), 10.0);
        assert_eq!(validate_price(&PriceValue::Number(5000.0)).unwrap(), 5000.0);
        assert_eq!(validate_price(&PriceValue::Text("99,999".to_string())).unwrap(), 100.0);
        assert!(validate_price(&PriceValue::Number(9.99)).is_err());
        assert!(validate_price(&PriceValue::Number(5000.01)).is_err());
        assert!(validate_price(&PriceValue::Number(0.0)).is_err());
        assert!(validate_price(&PriceValue::Text("abc".to_string())).is_err());
    }

    #[test]
    fn test_state_and_city_rules() {
        assert_eq!(validate_state("rj").unwrap(), "RJ");
        assert!(validate_state("XX").is_err());
        assert!(validate_state("S").is_err());

        assert_eq!(validate_city("RJ", "niterói").unwrap(), "Niterói");
        assert!(validate_city("RJ", "Campinas").is_err());
        // no directory for ES
        assert_eq!(validate_city("ES", " Vitória ").unwrap(), "Vitória");
    }

    #[test]
    fn test_phone_rules() {
        assert_eq!(normalize_phone("(11) 99999-9999").unwrap(), "11999999999");
        assert_eq!(normalize_phone("+5511999999999").unwrap(), "11999999999");
        assert_eq!(normalize_phone("11 3333-4444").unwrap(), "1133334444");
        assert!(normalize_phone("11 8999-99999").is_err()); // 11 digits without leading 9
        assert!(normalize_phone("01 3333-4444").is_err());
        assert!(normalize_phone("12345").is_err());
    }

    #[test]
    fn test_phone_and_whatsapp_must_differ() {
        let input = ProfileInput {
            whatsapp: Some("11999998888".to_string()),
            phone: Some("(11) 99999-8888".to_string()),
            ..valid_input()
        };

        let errors = validate_profile(&input).unwrap_err();
        assert!(errors.has("whatsapp"));
    }

    #[test]
    fn test_empty_optional_phone_clears_it() {
        let input = ProfileInput {
            phone: Some("".to_string()),
            ..valid_input()
        };
        assert_eq!(validate_profile(&input).unwrap().phone, None);
    }

    #[test]
    fn test_email_rules() {
        assert_eq!(validate_email("A@B.co").unwrap(), "a@b.co");
        assert!(validate_email("not-an-email").is_err());
    }

    #[test]
    fn test_merge_keeps_current_values() {
        let current = validate_profile(&valid_input()).unwrap();
        let patch = ProfileInput {
            price_per_session: Some(PriceValue::Number(200.0)),
            ..Default::default()
        };

        let merged = validate_profile(&patch.merged_over(&current)).unwrap();
        assert_eq!(merged.price_per_session, 200.0);
        assert_eq!(merged.name, current.name);
        assert_eq!(merged.phone, current.phone);
    }

    #[test]
    fn test_full_name_alias() {
        let input: ProfileInput = serde_json::from_str(r#"{"full_name": "Maria", "price_per_session": 120}"#).unwrap();
        assert_eq!(input.name.as_deref(), Some("Maria"));
        assert_eq!(input.price_per_session, Some(PriceValue::Number(120.0)));
    }
}
