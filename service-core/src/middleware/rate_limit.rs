use crate::error::AppError;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::{Clock, DefaultClock},
    state::keyed::DashMapStateStore,
    Quota, RateLimiter,
};
use std::{
    net::{IpAddr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
    time::Duration,
};

/// Rate limiter keyed by client IP address
pub type IpRateLimiter = Arc<RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock>>;

/// Allow `attempts` requests per `window_seconds` for each IP, replenished evenly.
pub fn create_ip_rate_limiter(attempts: u32, window_seconds: u64) -> IpRateLimiter {
    let burst = NonZeroU32::new(attempts.max(1)).unwrap_or(NonZeroU32::MIN);
    let period_ms = (window_seconds.max(1) * 1000) / u64::from(burst.get());
    let period = Duration::from_millis(period_ms.max(1));

    let quota = Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst);

    Arc::new(RateLimiter::dashmap(quota))
}

fn client_ip(request: &Request) -> Option<IpAddr> {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok());

    forwarded.or_else(|| {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    })
}

/// Middleware for IP-based rate limiting
pub async fn ip_rate_limit_middleware(
    State(limiter): State<IpRateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(ip) = client_ip(&request) else {
        tracing::warn!("Could not determine IP for rate limiting");
        return Ok(next.run(request).await);
    };

    match limiter.check_key(&ip) {
        Ok(_) => Ok(next.run(request).await),
        Err(negative) => {
            let wait_time = negative.wait_time_from(DefaultClock::default().now());
            tracing::warn!(ip = %ip, "Rate limit exceeded");
            Err(AppError::TooManyRequests(
                "Too many requests from this IP. Please try again later.".to_string(),
                Some(wait_time.as_secs().max(1)),
            ))
        }
    }
}
