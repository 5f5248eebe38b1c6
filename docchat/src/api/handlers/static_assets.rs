//! HTTP handlers for static asset serving.

use axum::{
    body::Body,
    http::{Response, StatusCode, Uri},
    response::IntoResponse,
};
use tracing::instrument;

use crate::static_assets;

/// Serve embedded frontend assets.
///
/// `/` maps to `index.html`, extensionless paths fall back to `{path}.html`
/// (so `/widget-demo` serves `widget-demo.html`), and anything unknown serves
/// the index page.
#[instrument]
pub async fn serve_embedded_asset(uri: Uri) -> impl IntoResponse {
    let mut path = uri.path().trim_start_matches('/');

    if path.is_empty() || path.ends_with('/') {
        path = "index.html";
    }

    if let Some(response) = asset_response(path) {
        return response;
    }

    // Extensionless page routes map to their .html asset
    if !path.contains('.')
        && let Some(response) = asset_response(&format!("{path}.html"))
    {
        return response;
    }

    // Unknown paths get the index page
    if let Some(response) = asset_response("index.html") {
        return response;
    }

    Response::builder().status(StatusCode::NOT_FOUND).body(Body::empty()).unwrap()
}

fn asset_response(path: &str) -> Option<Response<Body>> {
    let content = static_assets::Assets::get(path)?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    Some(
        Response::builder()
            .header(axum::http::header::CONTENT_TYPE, mime.as_ref())
            .header(axum::http::header::CACHE_CONTROL, "no-cache")
            .body(Body::from(content.data.into_owned()))
            .unwrap(),
    )
}
