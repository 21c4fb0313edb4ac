//! Request routing for the preview protocol.
//!
//! Every request is dispatched independently; the filesystem is the only
//! shared resource and it is owned by the user's editor, not by us. No
//! error originating from one request may take down the server loop or
//! affect other in-flight requests.

use axum::extract::{Query, State};
use axum::http::{header, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use mdserve_core::poll::{self, PollOutcome};
use mdserve_core::render::Renderer;
use mdserve_core::{assets, document, watcher};
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

/// Which filesystem scope the server exposes.
#[derive(Debug, Clone)]
pub enum ServeMode {
    /// One fixed document; static lookups resolve against its directory.
    SingleDocument { document: PathBuf, base_dir: PathBuf },
    /// A directory of documents, selected per request via `?path=`.
    Directory { base_dir: PathBuf },
}

impl ServeMode {
    /// Classify the command-line path as a document or a base directory.
    pub fn detect(path: &Path) -> std::io::Result<Self> {
        let path = path.canonicalize()?;
        if path.is_dir() {
            Ok(Self::Directory { base_dir: path })
        } else {
            let base_dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("/"));
            Ok(Self::SingleDocument {
                document: path,
                base_dir,
            })
        }
    }

    fn base_dir(&self) -> &Path {
        match self {
            Self::SingleDocument { base_dir, .. } => base_dir,
            Self::Directory { base_dir } => base_dir,
        }
    }

    /// Resolve the document a request concerns, fresh on every request.
    fn resolve_document(&self, query: &DocumentQuery) -> Result<PathBuf, StatusCode> {
        match self {
            Self::SingleDocument { document, .. } => Ok(document.clone()),
            Self::Directory { base_dir } => {
                let rel = query.path.as_deref().ok_or(StatusCode::BAD_REQUEST)?;
                let path = base_dir.join(rel);
                if path.is_file() {
                    Ok(path)
                } else {
                    Err(StatusCode::BAD_REQUEST)
                }
            }
        }
    }
}

/// Shared, read-only request context.
#[derive(Clone)]
pub struct ServerState {
    renderer: Arc<Renderer>,
    mode: Arc<ServeMode>,
    watch_timeout: Duration,
}

impl ServerState {
    pub fn new(renderer: Renderer, mode: ServeMode, watch_timeout: Duration) -> Self {
        Self {
            renderer: Arc::new(renderer),
            mode: Arc::new(mode),
            watch_timeout,
        }
    }
}

pub fn build_router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api", get(render_document))
        .route("/watch", get(watch_document))
        .fallback(get(serve_static))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, Default, Deserialize)]
struct DocumentQuery {
    path: Option<String>,
}

async fn index(State(state): State<ServerState>) -> Response {
    match state.mode.as_ref() {
        ServeMode::SingleDocument { .. } => Html(assets::shell_html()).into_response(),
        ServeMode::Directory { .. } => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn render_document(
    State(state): State<ServerState>,
    Query(query): Query<DocumentQuery>,
) -> Response {
    let document = match state.mode.resolve_document(&query) {
        Ok(document) => document,
        Err(status) => return status.into_response(),
    };

    match tokio::fs::read_to_string(&document).await {
        Ok(text) => {
            let html = state.renderer.render(&text);
            Json(serde_json::json!({ "data": html })).into_response()
        }
        Err(error) => {
            tracing::warn!(path = %document.display(), %error, "Failed to read document");
            StatusCode::BAD_REQUEST.into_response()
        }
    }
}

async fn watch_document(
    State(state): State<ServerState>,
    Query(query): Query<DocumentQuery>,
) -> Response {
    let document = match state.mode.resolve_document(&query) {
        Ok(document) => document,
        Err(status) => return status.into_response(),
    };

    match poll::wait_bounded(watcher::await_change(&document), state.watch_timeout).await {
        Ok(PollOutcome::Changed) => {
            tracing::debug!(path = %document.display(), "Change observed, releasing long poll");
        }
        Ok(PollOutcome::TimedOut) => {
            tracing::debug!(path = %document.display(), "Long poll timed out with no change");
        }
        Err(error) => {
            // A watch that cannot be set up reports "changed" immediately;
            // the client re-renders, and its retry backoff takes over if the
            // document is really gone.
            tracing::warn!(path = %document.display(), %error, "File watch failed");
        }
    }

    StatusCode::NO_CONTENT.into_response()
}

async fn serve_static(State(state): State<ServerState>, uri: Uri) -> Response {
    let rel = percent_decode_str(uri.path().trim_start_matches('/')).decode_utf8_lossy();
    let path = state.mode.base_dir().join(rel.as_ref());

    // In directory mode a markdown path gets the shell page, so every
    // document is previewable at its own URL.
    if matches!(state.mode.as_ref(), ServeMode::Directory { .. })
        && document::is_markdown_path(&path)
        && path.is_file()
    {
        return Html(assets::shell_html()).into_response();
    }

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&path).first_or_text_plain();
            ([(header::CONTENT_TYPE, mime.as_ref())], bytes).into_response()
        }
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "Failed to serve static file");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
