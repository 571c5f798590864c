use std::sync::Arc;

use async_graphql::http::GraphiQLSource;
use axum::{
    extract::State,
    response::{Html, IntoResponse},
    Extension, Json,
};

use crate::graphql::{Loaders, RequestContext};
use crate::middleware::BearerToken;
use crate::services::i18n::{Locale, Localizer};
use crate::services::Claims;
use crate::AppState;

/// `POST /query`
///
/// Executes one GraphQL request with a context built from the claims and
/// locale the middleware stack attached.
pub async fn graphql_handler(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    bearer: Option<Extension<BearerToken>>,
    locale: Option<Extension<Locale>>,
    Json(request): Json<async_graphql::Request>,
) -> impl IntoResponse {
    let locale = locale
        .map(|Extension(l)| l)
        .unwrap_or_else(|| state.catalog.default_locale());

    let localizer = Localizer::new(Arc::clone(&state.catalog), locale);
    let context = RequestContext {
        claims: claims.map(|Extension(c)| c),
        bearer_token: bearer.map(|Extension(BearerToken(t))| t),
        loaders: Loaders::new(&state.store, &localizer),
        localizer,
    };

    let response = state.schema.execute(request.data(context)).await;
    if response.is_err() {
        tracing::debug!(errors = response.errors.len(), "GraphQL request returned errors");
    }

    Json(response)
}

/// `GET /` in dev: GraphiQL pointed at `/query`.
pub async fn graphql_playground() -> Html<String> {
    Html(GraphiQLSource::build().endpoint("/query").finish())
}
