use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::state::SharedState;

mod admin;
pub mod auth;
mod error;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

use tokio::sync::RwLock;

use crate::services::{BootcampService, IdentityService};

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn identity_service(&self) -> &Arc<dyn IdentityService> {
        &self.shared.identity_service
    }

    #[must_use]
    pub fn bootcamp_service(&self) -> &Arc<dyn BootcampService> {
        &self.shared.bootcamp_service
    }
}

#[must_use]
pub fn create_app_state(shared: Arc<SharedState>) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
    })
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, secure_cookies, inactivity_minutes) = {
        let config = state.config().read().await;
        (
            config.server.cors_allowed_origins.clone(),
            config.server.secure_cookies,
            config.server.session_inactivity_minutes,
        )
    };

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            inactivity_minutes,
        )));

    let api_router = Router::new()
        .merge(create_admin_router(state.clone()))
        .merge(create_protected_router(state.clone()))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/signin", post(auth::signin))
        .route("/auth/signout", post(auth::signout))
        .route("/auth/provider", post(auth::provider_signin))
        .route("/health", get(health))
        .layer(session_layer)
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new().nest("/api", api_router).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer.allow_methods(Any).allow_headers(Any)),
    )
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::get_current_user))
        .route("/auth/password", put(auth::change_password))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}

fn create_admin_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/create", post(admin::create_staff))
        .route("/admin/applicants", get(admin::list_applicants))
        .route("/admin/trainees", get(admin::list_trainees))
        .route("/admin/fellows", get(admin::list_fellows))
        .route("/admin/instructors", get(admin::list_instructors))
        .route("/admin/admins", get(admin::list_admins))
        .route(
            "/admin/appt/{id}",
            get(admin::get_applicant).put(admin::update_applicant_status),
        )
        .route("/admin/appt/{id}/role", put(admin::change_applicant_role))
        .route(
            "/admin/appt/{id}/assessment",
            post(admin::add_assessment),
        )
        .route("/admin/trainee/{id}/rate", post(admin::rate_skill))
        .route("/admin/user/{id}", delete(admin::delete_user))
        .route("/admin/camp", get(admin::list_camps).post(admin::create_camp))
        .route("/admin/camp/{id}", get(admin::get_camp))
        .route(
            "/admin/camp/{id}/applicants",
            post(admin::enroll_applicant),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::admin_middleware,
        ))
}

/// GET /health
async fn health(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> Result<axum::Json<ApiResponse<HealthResponse>>, ApiError> {
    state.store().ping().await?;

    Ok(axum::Json(ApiResponse::success(HealthResponse {
        status: "ok".to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })))
}
