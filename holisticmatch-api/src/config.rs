/// Configuration management for the API server
///
/// Everything is read from environment variables (a `.env` file is loaded
/// first when present).
///
/// # Environment Variables
///
/// - `API_HOST` / `API_PORT`: bind address (default: 0.0.0.0:8000)
/// - `API_PRODUCTION`: enables HSTS (default: false)
/// - `CORS_ORIGINS`: comma-separated origins, `*` for permissive (default: *)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `JWT_SECRET`: signing key, at least 32 characters (required)
/// - `JWT_ACCESS_TOKEN_LIFETIME` / `JWT_REFRESH_TOKEN_LIFETIME`: hours (24 / 168)
/// - `EMAIL_VERIFICATION_TTL_HOURS` / `PASSWORD_RESET_TTL_HOURS`: hours (24 / 24)
/// - `FRONTEND_URL`: base of links sent by email (default: http://localhost:3000)
/// - `EMAIL_FROM`: sender address (default: noreply@holisticmatch.com)
/// - `RESEND_API_KEY`: enables the Resend notifier; unset logs emails instead
/// - `MEDIA_ROOT` / `MEDIA_URL`: photo storage (default: ./media, /media)
/// - `PAGE_SIZE`: professionals per listing page (default: 12)
///
/// # Example
///
/// ```no_run
/// use holisticmatch_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use holisticmatch_shared::services::AuthSettings;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

const MIN_SECRET_LEN: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub email: EmailConfig,
    pub media: MediaConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Production mode turns on HSTS
    pub production: bool,

    /// Allowed CORS origins; `*` means permissive
    pub cors_origins: Vec<String>,

    /// Professionals per listing page
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Session and one-time token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    pub access_ttl_hours: i64,
    pub refresh_ttl_hours: i64,
    pub verification_ttl_hours: i64,
    pub reset_ttl_hours: i64,
}

/// Outbound email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub frontend_url: String,
    pub from: String,

    /// Resend API key; `None` selects the log-only notifier
    #[serde(skip_serializing)]
    pub resend_api_key: Option<String>,
}

/// Photo storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Directory photos are written to
    pub root: String,

    /// URL prefix photos are served under
    pub url: String,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(name: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var_or(name, default)
        .parse::<T>()
        .with_context(|| format!("{} has an invalid value", name))
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a numeric variable
    /// does not parse, or the JWT secret is too short.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < MIN_SECRET_LEN {
            anyhow::bail!("JWT_SECRET must be at least {} characters long", MIN_SECRET_LEN);
        }

        let config = Self {
            api: ApiConfig {
                host: var_or("API_HOST", "0.0.0.0"),
                port: parse_var("API_PORT", "8000")?,
                production: parse_bool(&var_or("API_PRODUCTION", "false")),
                cors_origins: parse_origins(&var_or("CORS_ORIGINS", "*")),
                page_size: parse_var("PAGE_SIZE", "12")?,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", "10")?,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                access_ttl_hours: parse_var("JWT_ACCESS_TOKEN_LIFETIME", "24")?,
                refresh_ttl_hours: parse_var("JWT_REFRESH_TOKEN_LIFETIME", "168")?,
                verification_ttl_hours: parse_var("EMAIL_VERIFICATION_TTL_HOURS", "24")?,
                reset_ttl_hours: parse_var("PASSWORD_RESET_TTL_HOURS", "24")?,
            },
            email: EmailConfig {
                frontend_url: var_or("FRONTEND_URL", "http://localhost:3000"),
                from: var_or("EMAIL_FROM", "noreply@holisticmatch.com"),
                resend_api_key: env::var("RESEND_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            },
            media: MediaConfig {
                root: var_or("MEDIA_ROOT", "./media"),
                url: var_or("MEDIA_URL", "/media"),
            },
        };

        if config.jwt.access_ttl_hours <= 0 || config.jwt.refresh_ttl_hours <= 0 {
            anyhow::bail!("JWT token lifetimes must be positive");
        }

        Ok(config)
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Settings handed to the account services
    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            access_ttl: chrono::Duration::hours(self.jwt.access_ttl_hours),
            refresh_ttl: chrono::Duration::hours(self.jwt.refresh_ttl_hours),
            verification_ttl: chrono::Duration::hours(self.jwt.verification_ttl_hours),
            reset_ttl: chrono::Duration::hours(self.jwt.reset_ttl_hours),
            ..AuthSettings::new(self.jwt.secret.clone())
        }
    }

    /// True when any origin is allowed
    pub fn cors_is_permissive(&self) -> bool {
        self.api.cors_origins.iter().any(|origin| origin == "*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
                production: false,
                cors_origins: vec!["*".to_string()],
                page_size: 12,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                access_ttl_hours: 24,
                refresh_ttl_hours: 168,
                verification_ttl_hours: 24,
                reset_ttl_hours: 2,
            },
            email: EmailConfig {
                frontend_url: "http://localhost:3000".to_string(),
                from: "noreply@holisticmatch.com".to_string(),
                resend_api_key: None,
            },
            media: MediaConfig {
                root: "./media".to_string(),
                url: "/media".to_string(),
            },
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(sample().bind_address(), "127.0.0.1:8000");
    }

    #[test]
    fn test_auth_settings_carry_lifetimes() {
        let settings = sample().auth_settings();

        assert_eq!(settings.jwt_secret, "test-secret-key-at-least-32-bytes-long");
        assert_eq!(settings.refresh_ttl, chrono::Duration::hours(168));
        assert_eq!(settings.reset_ttl, chrono::Duration::hours(2));
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("https://holisticmatch.com/, http://localhost:3000,,"),
            vec!["https://holisticmatch.com", "http://localhost:3000"]
        );
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool(" YES "));
        assert!(!parse_bool("false"));
        assert!(!parse_bool(""));
    }

    #[test]
    fn test_cors_is_permissive() {
        let mut config = sample();
        assert!(config.cors_is_permissive());

        config.api.cors_origins = vec!["https://holisticmatch.com".to_string()];
        assert!(!config.cors_is_permissive());
    }
}
