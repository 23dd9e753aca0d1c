#![allow(dead_code)]

/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - A router over the in-memory store with cheap password hashing
/// - A recording notifier standing in for the email transport
/// - A throwaway media directory for photo uploads
/// - Request helpers and account fixtures

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use holisticmatch_api::app::{build_router, AppState};
use holisticmatch_api::config::{ApiConfig, Config, DatabaseConfig, EmailConfig, JwtConfig, MediaConfig};
use holisticmatch_shared::services::notifier::{Notifier, NotifyError};
use holisticmatch_shared::services::photos::LocalPhotoStorage;
use holisticmatch_shared::services::AuthSettings;
use holisticmatch_shared::store::memory::MemoryStore;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower::Service as _;
use uuid::Uuid;

pub const SECRET: &str = "integration-test-secret-at-least-32-bytes";
pub const PASSWORD: &str = "Secret1A";

/// One email the services asked to send
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub link: String,
    pub reset: bool,
}

/// Notifier that keeps every message in memory
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<SentEmail>>>,
}

impl RecordingNotifier {
    fn record(&self, to: &str, link: &str, reset: bool) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentEmail {
                to: to.to_string(),
                link: link.to_string(),
                reset,
            });
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_verification(&self, to: &str, link: &str) -> Result<(), NotifyError> {
        self.record(to, link, false);
        Ok(())
    }

    async fn send_password_reset(&self, to: &str, link: &str) -> Result<(), NotifyError> {
        self.record(to, link, true);
        Ok(())
    }
}

/// Token at the end of an emailed link (`.../verify-email/<t>` or `...?token=<t>`)
pub fn token_of(link: &str) -> String {
    link.rsplit(|c| c == '/' || c == '=')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub app: axum::Router,
    pub store: Arc<MemoryStore>,
    pub notifier: RecordingNotifier,
    pub media_root: PathBuf,
}

pub fn test_config(media_root: &str, page_size: u32) -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            production: false,
            cors_origins: vec!["*".to_string()],
            page_size,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: SECRET.to_string(),
            access_ttl_hours: 24,
            refresh_ttl_hours: 168,
            verification_ttl_hours: 24,
            reset_ttl_hours: 24,
        },
        email: EmailConfig {
            frontend_url: "http://localhost:3000".to_string(),
            from: "noreply@holisticmatch.com".to_string(),
            resend_api_key: None,
        },
        media: MediaConfig {
            root: media_root.to_string(),
            url: "/media".to_string(),
        },
    }
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_page_size(12)
    }

    pub fn with_page_size(page_size: u32) -> Self {
        let media_root = std::env::temp_dir().join(format!("holisticmatch-test-{}", Uuid::new_v4().simple()));
        let media = media_root.to_string_lossy().to_string();
        let config = test_config(&media, page_size);

        let store = Arc::new(MemoryStore::new());
        let notifier = RecordingNotifier::default();
        let photos = LocalPhotoStorage::new(&media_root, &config.media.url);

        let state = AppState::with_settings(
            config,
            AuthSettings::for_tests(SECRET),
            store.clone(),
            Arc::new(notifier.clone()),
            Arc::new(photos),
        )
        .expect("Failed to build app state");

        Self {
            app: build_router(state),
            store,
            notifier,
            media_root,
        }
    }

    /// Sends a request and returns the status with the JSON body (`Null` when empty)
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, None, Some(body)).await
    }

    /// Waits for the next email of the given kind sent to `to`
    pub async fn link_for(&self, to: &str, reset: bool, nth: usize) -> String {
        let notifier = self.notifier.clone();
        let to = to.to_string();

        let mut link = None;
        for _ in 0..200 {
            let matching: Vec<_> = notifier
                .sent()
                .into_iter()
                .filter(|m| m.to == to && m.reset == reset)
                .collect();
            if let Some(message) = matching.get(nth) {
                link = Some(message.link.clone());
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        link.unwrap_or_else(|| panic!("no email #{} for {} (reset={})", nth, to, reset))
    }

    pub async fn verification_token(&self, email: &str) -> String {
        token_of(&self.link_for(email, false, 0).await)
    }

    /// Registers, verifies and logs in; returns (professional id, access token)
    pub async fn active_professional(&self, name: &str, email: &str) -> (i64, String) {
        let (status, body) = self.post("/api/v1/auth/register", profile(name, email)).await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        let id = body["professional_id"].as_i64().unwrap();

        let token = self.verification_token(email).await;
        let (status, _) = self.post("/api/v1/auth/verify-email", json!({ "token": token })).await;
        assert_eq!(status, StatusCode::OK);

        (id, self.login(email, PASSWORD).await)
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .post("/api/v1/auth/login", json!({ "email": email, "password": password }))
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["access"].as_str().unwrap().to_string()
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.media_root);
    }
}

/// Valid registration payload
pub fn profile(name: &str, email: &str) -> Value {
    json!({
        "name": name,
        "bio": "Terapeuta holística dedicada ao Reiki e à aromaterapia há mais de dez anos.",
        "services": ["Reiki", "Aromaterapia"],
        "city": "Rio de Janeiro",
        "state": "RJ",
        "price_per_session": 150,
        "attendance_type": "online",
        "email": email,
        "password": PASSWORD,
    })
}

/// Multipart body with one file field named `photo`
pub fn photo_upload(uri: &str, token: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let boundary = "holisticmatch-test-boundary";

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"photo\"; filename=\"photo\"\r\n");
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}
