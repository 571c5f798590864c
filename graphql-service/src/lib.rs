pub mod config;
pub mod db;
pub mod dtos;
pub mod graphql;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::{make_request_span, request_id_middleware},
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::graphql::{build_schema, AppSchema};
use crate::middleware::{claims_middleware, locale_middleware};
use crate::services::{
    AccountService, AccountStore, Catalog, EmailProvider, JwtService, Locale, PasswordResetService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub store: Arc<dyn AccountStore>,
    pub jwt: Arc<JwtService>,
    pub catalog: Arc<Catalog>,
    pub schema: AppSchema,
    pub metrics: PrometheusHandle,
    pub graphql_rate_limiter: IpRateLimiter,
}

impl AppState {
    /// Wire the workflow services and schema around the given collaborators.
    pub fn new(
        config: ServiceConfig,
        store: Arc<dyn AccountStore>,
        mailer: Arc<dyn EmailProvider>,
        metrics: PrometheusHandle,
    ) -> Result<Self, AppError> {
        let default_locale: Locale = config
            .i18n
            .default_locale
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;
        let catalog = Arc::new(Catalog::embedded(default_locale).map_err(AppError::ConfigError)?);

        let jwt = Arc::new(JwtService::new(&config.jwt));
        let accounts = AccountService::new(Arc::clone(&store), Arc::clone(&jwt));
        let password_resets =
            PasswordResetService::new(Arc::clone(&store), mailer, &config.password_reset);
        let schema = build_schema(accounts, password_resets);

        let graphql_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.graphql_attempts,
            config.rate_limit.graphql_window_seconds,
        );

        Ok(Self {
            config: Arc::new(config),
            store,
            jwt,
            catalog,
            schema,
            metrics,
            graphql_rate_limiter,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let graphql_routes = Router::new()
        .route("/query", post(handlers::graphql_handler))
        .layer(from_fn_with_state(
            state.graphql_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let mut app = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .merge(graphql_routes);

    if state.config.is_dev() {
        app = app.route("/", get(handlers::graphql_playground));
    }

    app.layer(from_fn_with_state(state.clone(), locale_middleware))
        .layer(from_fn_with_state(state.clone(), claims_middleware))
        .with_state(state.clone())
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<axum::body::Body>))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(CatchPanicLayer::new())
        .layer(cors_layer(&state.config.security.allowed_origins))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed_origins.iter().filter_map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|e| tracing::error!(origin = %origin, error = %e, "Skipping invalid CORS origin"))
                .ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ACCEPT_LANGUAGE,
        ])
        .max_age(std::time::Duration::from_secs(300))
}
