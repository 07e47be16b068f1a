//! Preview server over whatever the output writer currently holds.

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use blogsmith_generator::{OutputError, OutputWriter};
use percent_encoding::percent_decode_str;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Default listen address.
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Server state.
#[derive(Clone)]
pub struct ServerState {
    writer: Arc<dyn OutputWriter>,
    ext: String,
}

impl ServerState {
    #[must_use]
    pub fn new(writer: Arc<dyn OutputWriter>, ext: impl Into<String>) -> Self {
        Self {
            writer,
            ext: ext.into(),
        }
    }
}

/// Create the preview router.
pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .fallback(serve_file)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Serve `router` on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router).with_graceful_shutdown(shutdown).await
}

async fn serve_file(State(state): State<Arc<ServerState>>, uri: Uri) -> Response {
    let Some(path) = resolve_path(uri.path(), &state.ext) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match state.writer.read_file(&path) {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type(&path))], bytes).into_response(),
        Err(e) if e.is_not_found() || matches!(e, OutputError::Path(_)) => StatusCode::NOT_FOUND.into_response(),
        Err(e) if e.is_permission_denied() => StatusCode::FORBIDDEN.into_response(),
        Err(e) => {
            tracing::error!(path = %path, error = %e, "failed to read output file");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Map a request path to an output path. Directory paths get the index page.
///
/// The path is percent-decoded first; `None` if it is not valid UTF-8.
fn resolve_path(request: &str, ext: &str) -> Option<String> {
    let decoded = percent_decode_str(request).decode_utf8().ok()?;
    let trimmed = decoded.trim_start_matches('/');
    if trimmed.is_empty() || trimmed.ends_with('/') {
        Some(format!("{trimmed}index.{ext}"))
    } else {
        Some(trimmed.to_string())
    }
}

fn content_type(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "text/javascript; charset=utf-8",
        "xml" | "xsl" => "application/xml; charset=utf-8",
        "json" => "application/json",
        "txt" | "md" => "text/plain; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}
