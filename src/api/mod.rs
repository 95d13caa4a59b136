use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use time;

use crate::config::Config;
use crate::services::Notifier;
use crate::state::SharedState;

mod alumni;
mod applications;
pub mod auth;
mod error;
mod events;
pub mod guard;
mod mentorships;
mod transfer;
mod types;

pub use error::ApiError;
pub use types::*;

use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,
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
    pub fn auth(&self) -> &Arc<dyn crate::services::AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn reset(&self) -> &Arc<dyn crate::services::ResetService> {
        &self.shared.reset_service
    }

    #[must_use]
    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.shared.notifier
    }
}

pub async fn create_app_state(shared: Arc<SharedState>) -> Arc<AppState> {
    Arc::new(AppState { shared })
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared).await)
}

/// Test seam: identical to [`create_app_state_from_config`] but with an
/// injected notifier instead of a live SMTP transport.
pub async fn create_app_state_with_notifier(
    config: Config,
    notifier: Arc<dyn Notifier>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::with_notifier(config, notifier).await?);
    Ok(create_app_state(shared).await)
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, secure_cookies, session_ttl_minutes) = {
        let config = state.config().read().await;
        (
            config.server.cors_allowed_origins.clone(),
            config.server.secure_cookies,
            config.server.session_ttl_minutes,
        )
    };

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(i64::from(
            session_ttl_minutes,
        ))));

    let api_router = Router::new()
        .merge(create_protected_router(state.clone()))
        .merge(create_admin_router(state.clone()))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/register", post(auth::register))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .route(
            "/mentor-applications",
            post(applications::submit_application),
        )
        .layer(session_layer)
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

/// Routes behind any authenticated session.
fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::get_current_user))
        .route("/auth/password", put(auth::change_password))
        .route("/alumni", get(alumni::list_alumni))
        .route("/alumni", post(alumni::create_alumni))
        .route("/alumni/import-csv", post(transfer::import_alumni_csv))
        .route("/alumni/{id}", get(alumni::get_alumni))
        .route("/alumni/{id}", put(alumni::update_alumni))
        .route("/alumni/{id}", delete(alumni::delete_alumni))
        .route("/events", get(events::list_events))
        .route("/events", post(events::create_event))
        .route("/events/{id}", get(events::get_event))
        .route("/events/{id}", put(events::update_event))
        .route("/events/{id}", delete(events::delete_event))
        .route("/mentorships", get(mentorships::list_mentorships))
        .route("/mentorships", post(mentorships::create_mentorship))
        .route("/mentorships/{id}", get(mentorships::get_mentorship))
        .route("/mentorships/{id}", put(mentorships::update_mentorship))
        .route("/mentorships/{id}", delete(mentorships::delete_mentorship))
        .route("/insights", get(transfer::insights))
        .route("/export/json", get(transfer::export_json))
        .route_layer(middleware::from_fn_with_state(state, guard::session_guard))
}

/// Routes behind an admin session.
fn create_admin_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/users", post(auth::create_user))
        .route(
            "/admin/mentor-applications",
            get(applications::list_applications),
        )
        .route(
            "/admin/mentor-applications/{id}/approve",
            post(applications::approve_application),
        )
        .route(
            "/admin/mentor-applications/{id}/reject",
            post(applications::reject_application),
        )
        .route("/import/json", post(transfer::import_json))
        .route_layer(middleware::from_fn_with_state(state, guard::admin_guard))
}
