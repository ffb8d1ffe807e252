use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use futures_util::TryStreamExt;
use serde::Serialize;
use tokio_util::io::StreamReader;

use ingest_api::IngestError;

use super::AppState;

/// Multipart field carrying the newline-delimited file.
pub(crate) const UPLOAD_FIELD: &str = "jsonlines";

const FILE_FORM: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <title>Upload JSON Lines</title>
  </head>
  <body>
    <form enctype="multipart/form-data" action="/upload" method="post">
      <input type="file" name="jsonlines" />
      <input type="submit" value="upload" />
    </form>
  </body>
</html>
"#;

fn bad_request(e: IngestError) -> Response {
    (StatusCode::BAD_REQUEST, e.to_string()).into_response()
}

// ═══════════════════════════════════════════════════════════════
//  GET /
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_form() -> impl IntoResponse {
    Html(FILE_FORM)
}

// ═══════════════════════════════════════════════════════════════
//  GET /healthz
// ═══════════════════════════════════════════════════════════════

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

pub(crate) async fn handle_healthz() -> impl IntoResponse {
    axum::Json(Health { status: "ok" })
}

// ═══════════════════════════════════════════════════════════════
//  POST /upload  (multipart, field "jsonlines")
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Response {
    tracing::info!("file upload endpoint hit");
    match ingest_upload(&state, multipart).await {
        Ok(records) => format!("{records} records written").into_response(),
        Err(e) => bad_request(e),
    }
}

/// Streams the upload field straight into the splitter. The field is
/// dropped when this returns, whatever the outcome.
async fn ingest_upload(state: &AppState, mut multipart: Multipart) -> Result<usize, IngestError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| IngestError::format(format!("multipart: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let reader = StreamReader::new(field.map_err(std::io::Error::other));
        return state.ingestor.ingest_stream(Box::pin(reader)).await.into_result();
    }
    Err(IngestError::format(format!(
        "missing multipart field '{UPLOAD_FIELD}'"
    )))
}

// ═══════════════════════════════════════════════════════════════
//  POST /rest  {"topic": "...", "lines": [...]}
// ═══════════════════════════════════════════════════════════════

#[derive(Serialize)]
struct RecordsWritten {
    records: usize,
}

pub(crate) async fn handle_rest(State(state): State<AppState>, body: Bytes) -> Response {
    match state.ingestor.ingest_batch(&body).await.into_result() {
        Ok(records) => axum::Json(RecordsWritten { records }).into_response(),
        Err(e) => bad_request(e),
    }
}
