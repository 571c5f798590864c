use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::AppState;

/// The raw bearer token of an authenticated request.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// Attach verified [`Claims`](crate::services::Claims) and the raw token to the request.
///
/// Never rejects: a missing, malformed or expired token leaves the request
/// anonymous and field-level authorization decides what it may see.
pub async fn claims_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    if let Some(token) = token {
        match state.jwt.verify(&token) {
            Ok(claims) => {
                tracing::debug!(user_id = claims.user_id, "Request authenticated");
                req.extensions_mut().insert(claims);
                req.extensions_mut().insert(BearerToken(token));
            }
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid bearer token");
            }
        }
    }

    next.run(req).await
}
