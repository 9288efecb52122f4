use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio_util::io::ReaderStream;
use tracing::warn;

use crate::server::RelayState;

/// `GET /dl/client` - serve the relay binary so devices can fetch the client.
pub async fn download_client(State(state): State<Arc<RelayState>>) -> Response {
    let path = match binary_path(state.config.binary_path.as_ref()) {
        Ok(path) => path,
        Err(err) => {
            warn!(error = %err, "cannot resolve client binary path");
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cannot open client binary");
            return StatusCode::NOT_FOUND.into_response();
        }
    };
    let len = match file.metadata().await {
        Ok(metadata) => metadata.len(),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cannot stat client binary");
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    (
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_LENGTH, HeaderValue::from(len)),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response()
}

fn binary_path(configured: Option<&PathBuf>) -> std::io::Result<PathBuf> {
    match configured {
        Some(path) => Ok(path.clone()),
        None => std::env::current_exe(),
    }
}
