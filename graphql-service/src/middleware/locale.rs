use axum::{
    extract::{Query, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde::Deserialize;

use crate::services::i18n::negotiate;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LocaleQuery {
    lang: Option<String>,
}

/// Negotiate the response locale and store it as a request extension.
///
/// `?lang=` wins over `Accept-Language`; anything unsupported falls back to
/// the configured default.
pub async fn locale_middleware(
    State(state): State<AppState>,
    query: Option<Query<LocaleQuery>>,
    mut req: Request,
    next: Next,
) -> Response {
    let lang = query.and_then(|Query(q)| q.lang);
    let accept_language = req
        .headers()
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok());

    let locale = negotiate(
        lang.as_deref(),
        accept_language,
        state.catalog.default_locale(),
    );
    req.extensions_mut().insert(locale);

    next.run(req).await
}
