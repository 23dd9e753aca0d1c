/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use holisticmatch_api::{app::AppState, config::Config};
/// use holisticmatch_shared::services::{notifier::LogNotifier, photos::LocalPhotoStorage};
/// use holisticmatch_shared::store::memory::MemoryStore;
/// use std::sync::Arc;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let photos = LocalPhotoStorage::new(&config.media.root, &config.media.url);
/// let state = AppState::new(
///     config,
///     Arc::new(MemoryStore::new()),
///     Arc::new(LogNotifier),
///     Arc::new(photos),
/// )?;
/// let app = holisticmatch_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::auth::jwt_auth_layer, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use holisticmatch_shared::services::{
    notifier::{LinkBuilder, Notifier},
    photos::{PhotoStorage, MAX_PHOTO_BYTES},
    AuthError, AuthService, AuthSettings, ProfessionalService, RegistrationService,
};
use holisticmatch_shared::store::Store;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Multipart framing on top of the largest accepted photo
const BODY_LIMIT: usize = MAX_PHOTO_BYTES + 1024 * 1024;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Every field is reference-counted, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Persistence seam, used directly only by the health check
    pub store: Arc<dyn Store>,

    pub auth: AuthService,
    pub registration: RegistrationService,
    pub professionals: ProfessionalService,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the services with the settings derived from `config`
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        photos: Arc<dyn PhotoStorage>,
    ) -> Result<Self, AuthError> {
        let settings = config.auth_settings();
        Self::with_settings(config, settings, store, notifier, photos)
    }

    /// Same as [`AppState::new`] with explicit account settings
    pub fn with_settings(
        config: Config,
        settings: AuthSettings,
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        photos: Arc<dyn PhotoStorage>,
    ) -> Result<Self, AuthError> {
        let settings = Arc::new(settings);
        let links = LinkBuilder::new(config.email.frontend_url.clone());

        Ok(Self {
            auth: AuthService::new(store.clone(), settings.clone())?,
            registration: RegistrationService::new(store.clone(), notifier, links, settings),
            professionals: ProfessionalService::new(store.clone(), photos, config.api.page_size),
            store,
            config: Arc::new(config),
        })
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                                   # Health check (public)
/// ├── /media/*                                  # Uploaded photos
/// └── /api/v1/
///     ├── /auth/
///     │   ├── POST /login
///     │   ├── POST /refresh
///     │   ├── GET  /me                          (bearer)
///     │   ├── POST /register
///     │   ├── POST /verify-email
///     │   ├── POST /resend-verification
///     │   ├── POST /password-reset
///     │   └── POST /password-reset-confirm
///     ├── /professionals/
///     │   ├── GET    /
///     │   ├── GET    /:id
///     │   ├── PUT    /:id                       (bearer, owner)
///     │   ├── PATCH  /:id                       (bearer, owner)
///     │   ├── DELETE /:id                       (bearer, owner)
///     │   └── POST   /:id/photo                 (bearer, owner)
///     ├── GET /service-types
///     └── GET /cities/:state
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Request tracing (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Bearer authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let auth_layer = axum::middleware::from_fn_with_state(state.clone(), jwt_auth_layer);

    let auth_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/register", post(routes::auth::register))
        .route("/verify-email", post(routes::auth::verify_email))
        .route("/resend-verification", post(routes::auth::resend_verification))
        .route("/password-reset", post(routes::auth::password_reset))
        .route("/password-reset-confirm", post(routes::auth::password_reset_confirm))
        .merge(
            Router::new()
                .route("/me", get(routes::auth::me))
                .route_layer(auth_layer.clone()),
        );

    let public_professional_routes = Router::new()
        .route("/", get(routes::professionals::list))
        .route("/:id", get(routes::professionals::get));

    let owner_professional_routes = Router::new()
        .route(
            "/:id",
            axum::routing::put(routes::professionals::replace)
                .patch(routes::professionals::update)
                .delete(routes::professionals::delete),
        )
        .route("/:id/photo", post(routes::professionals::upload_photo))
        .route_layer(auth_layer);

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest(
            "/professionals",
            public_professional_routes.merge(owner_professional_routes),
        )
        .route("/service-types", get(routes::reference::service_types))
        .route("/cities/:state", get(routes::reference::cities));

    let cors = if state.config.cors_is_permissive() {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    let media_path = format!("/{}", state.config.media.url.trim_matches('/'));
    let media = ServeDir::new(&state.config.media.root);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api/v1", v1_routes)
        .nest_service(&media_path, media)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
