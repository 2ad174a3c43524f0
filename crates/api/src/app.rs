use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::{LoggingTicketNotifier, TicketNotifier};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, security_headers_middleware,
    trace_id, RateLimiterState,
};
use crate::routes::{check_ins, events, health, registrations};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
    pub notifier: Arc<dyn TicketNotifier>,
}

/// Builds the application with the logging ticket notifier.
pub fn create_app(config: Config, pool: PgPool) -> Router {
    let notifier = Arc::new(LoggingTicketNotifier::new(config.notifications.enabled));
    create_app_with_notifier(config, pool, notifier)
}

/// Builds the application with a caller-provided ticket notifier.
pub fn create_app_with_notifier(
    config: Config,
    pool: PgPool,
    notifier: Arc<dyn TicketNotifier>,
) -> Router {
    let config = Arc::new(config);

    // None when rate_limit_per_minute is 0
    let rate_limiter = RateLimiterState::new(config.security.rate_limit_per_minute).map(Arc::new);

    let state = AppState {
        pool,
        config: config.clone(),
        rate_limiter,
        notifier,
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Public registration submission, rate limited per client IP
    let registration_routes = Router::new()
        .route(
            "/api/v1/events/:event_id/registrations",
            post(registrations::submit_registration),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    // Check-in desk and lookup routes
    let desk_routes = Router::new()
        .route(
            "/api/v1/registrations",
            get(registrations::search_registrations),
        )
        .route(
            "/api/v1/registrations/:registration_id",
            get(registrations::get_registration),
        )
        .route(
            "/api/v1/registrations/:registration_id/cancel",
            post(registrations::cancel_registration),
        )
        .route(
            "/api/v1/registrations/:registration_id/check-in",
            post(check_ins::check_in).delete(check_ins::undo_check_in),
        )
        .route(
            "/api/v1/registrations/:registration_id/check-ins",
            get(check_ins::list_check_ins),
        )
        .route(
            "/api/v1/tickets/:ticket_number",
            get(registrations::get_by_ticket),
        )
        .route(
            "/api/v1/tickets/:ticket_number/check-in",
            post(check_ins::check_in_by_ticket),
        )
        .route("/api/v1/check-ins", post(check_ins::resolve_check_in));

    // Organizer event management
    let event_routes = Router::new()
        .route(
            "/api/v1/events",
            post(events::create_event).get(events::list_events),
        )
        .route(
            "/api/v1/events/:event_id",
            get(events::get_event).patch(events::update_event),
        );

    // Operational routes
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(registration_routes)
        .merge(desk_routes)
        .merge(event_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
