//! App state and router assembly.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::{header::AUTHORIZATION, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use constant_time_eq::constant_time_eq;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use tower_http::trace::TraceLayer;
use torhaus_audit::{AuditLog, MemoryAuditLog};
use torhaus_core::{InviteService, ReservationIntake};
use torhaus_crypto::TokenHasher;

use crate::backend::StoreBackend;
use crate::config::{ConfigError, ServerConfig};
use crate::email::InviteMailer;
use crate::handlers::{invites, reservations, validate, ApiError};
use crate::metrics::init_metrics;
use crate::rate_limit::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub store: StoreBackend,
    pub invites: InviteService<StoreBackend>,
    pub intake: Arc<ReservationIntake<StoreBackend>>,
    pub mailer: Option<Arc<InviteMailer>>,
    pub audit: Arc<dyn AuditLog>,
    pub rate_limiter: Arc<RateLimiter>,
    pub admin_token: String,
    pub base_url: String,
    pub metrics: PrometheusHandle,
}

impl AppState {
    pub fn new(
        store: StoreBackend,
        config: &ServerConfig,
        hasher: Arc<TokenHasher>,
        mailer: Option<Arc<InviteMailer>>,
    ) -> Result<Self, ConfigError> {
        let admin_token = config.require_admin_token()?.to_string();
        let invites = InviteService::new(store.clone(), hasher, config.default_expiry_days);
        let intake = Arc::new(ReservationIntake::new(store.clone(), invites.clone()));

        Ok(Self {
            store,
            invites,
            intake,
            mailer,
            audit: Arc::new(MemoryAuditLog::new()),
            rate_limiter: Arc::new(RateLimiter::new(
                Duration::from_millis(config.rate_limit_window_ms),
                config.rate_limit_max,
            )),
            admin_token,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            metrics: init_metrics(),
        })
    }
}

async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let authorized = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| constant_time_eq(token.as_bytes(), state.admin_token.as_bytes()))
        .unwrap_or(false);

    if !authorized {
        return ApiError::Unauthorized.into_response();
    }
    next.run(req).await
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn render_metrics(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, state.metrics.render())
}

pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route(
            "/api/admin/invites",
            post(invites::create)
                .get(invites::list)
                .delete(invites::delete_many),
        )
        .route("/api/admin/invites/{id}/revoke", post(invites::revoke))
        .route("/api/admin/invites/{id}/resend", post(invites::resend))
        .route("/api/admin/reservations", get(reservations::list))
        .route(
            "/api/admin/reservations/{id}/status",
            post(reservations::update_status),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin,
        ));

    Router::new()
        .route("/api/invites/validate", get(validate::validate_invite))
        .route("/api/reservations", post(reservations::create))
        .route("/healthz", get(healthz))
        .route("/metrics", get(render_metrics))
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
