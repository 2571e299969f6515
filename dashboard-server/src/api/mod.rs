//! API routes for the dashboard server

pub mod dashboard;
pub mod health;
pub mod payment;
pub mod sales;
pub mod subscription;

use axum::routing::{get, post};
use axum::{Router, middleware};
use shared::error::AppError;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::session_auth_middleware;
use crate::state::AppState;

pub type ApiResult<T> = Result<axum::Json<T>, AppError>;

const MAX_IN_FLIGHT: usize = 100;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Merchant API (bearer session)
    let merchant = Router::new()
        .route("/api/payment/create", post(payment::create_payment))
        .route("/api/payment/{charge_id}/pix", get(payment::pix_payload))
        .route("/api/subscription/data", get(subscription::subscription_data))
        .route(
            "/api/subscription/change-plan/preview",
            post(subscription::preview_plan_change),
        )
        .route("/api/subscription/change-plan", post(subscription::change_plan))
        .route("/api/sales/quote", post(sales::quote))
        .route("/api/sales", post(sales::register))
        .route("/api/dashboard/stats", get(dashboard::stats))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(merchant)
        .layer(ConcurrencyLimitLayer::new(MAX_IN_FLIGHT))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
