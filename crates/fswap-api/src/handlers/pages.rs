//! Static pages.

use axum::response::Html;

/// Serve the upload UI.
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}
