//! Static File Serving
//!
//! Serves the upload page and any assets from the configured static
//! directory, with an inline fallback page when nothing is deployed.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::path::PathBuf;
use tower_http::services::ServeDir;

/// Create router for serving static files
pub fn router(static_dir: &str) -> Router {
    let dir = PathBuf::from(static_dir);
    let serve_dir = ServeDir::new(&dir).append_index_html_on_directories(true);

    let index_dir = dir.clone();
    Router::new()
        .route("/", get(move || serve_index(index_dir.clone())))
        .fallback_service(serve_dir)
}

/// Serve the index page, or the built-in upload form when the static
/// directory has none.
async fn serve_index(dir: PathBuf) -> Response {
    if let Ok(content) = tokio::fs::read_to_string(dir.join("index.html")).await {
        return (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            content,
        )
            .into_response();
    }

    let fallback_html = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Blobshare</title>
</head>
<body>
    <h1>Blobshare</h1>
    <p>The server is running. Upload a file to receive a download link
    that stays valid for 24 hours.</p>
    <form action="/upload" method="post" enctype="multipart/form-data">
        <input type="file" name="file" />
        <button type="submit">Upload</button>
    </form>
    <p><a href="/api/health">API Health</a></p>
</body>
</html>"#;

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        fallback_html.to_string(),
    )
        .into_response()
}
