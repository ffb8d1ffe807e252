mod http;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio_util::sync::CancellationToken;

use ingest_engine::Ingestor;

#[derive(Clone)]
struct AppState {
    ingestor: Arc<Ingestor>,
}

/// Build the HTTP router.
///
/// `body_limit` caps `/rest` bodies in bytes; 0 disables the cap.
/// `/upload` is streamed line by line and is never capped.
pub fn router(ingestor: Arc<Ingestor>, body_limit: usize) -> Router {
    let rest_limit = if body_limit == 0 {
        DefaultBodyLimit::disable()
    } else {
        DefaultBodyLimit::max(body_limit)
    };

    Router::new()
        .route("/", get(http::handle_form))
        .route("/healthz", get(http::handle_healthz))
        .route(
            "/upload",
            post(http::handle_upload).layer(DefaultBodyLimit::disable()),
        )
        .route("/rest", post(http::handle_rest).layer(rest_limit))
        .with_state(AppState { ingestor })
}

/// Serve `app` on `listen` until `shutdown` is cancelled.
pub async fn run(listen: &str, app: Router, shutdown: CancellationToken) -> Result<(), String> {
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| format!("bind api {listen}: {e}"))?;

    tracing::info!(listen = %listen, "http api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| format!("axum serve: {e}"))?;

    Ok(())
}
