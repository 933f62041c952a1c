//! Image serving endpoint
//!
//! GET /view/{session_id} - Serve the image stored under a session

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tracing::error;

use super::{pages, AppState};

/// Build the view router
pub fn router() -> Router<AppState> {
    Router::new().route("/view/{session_id}", get(view_image))
}

/// Serve an image by session id
async fn view_image(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    match state.relay.fetch(&session_id).await {
        Ok(image) => {
            let etag = image.etag();
            let unchanged = headers
                .get(header::IF_NONE_MATCH)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.split(',').any(|tag| tag.trim() == etag));
            if unchanged {
                return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response();
            }

            let disposition = format!(
                "inline; filename=\"image_{}.{}\"",
                image.session_id,
                image.extension()
            );
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, image.content_type().to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                    (header::ETAG, etag),
                    (header::CACHE_CONTROL, "public, max-age=300".to_string()),
                ],
                image.data,
            )
                .into_response()
        }
        Err(e) if e.is_not_found() => {
            (StatusCode::NOT_FOUND, Html(pages::not_found(&session_id))).into_response()
        }
        Err(e) => {
            error!("Error serving image {}: {}", session_id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error serving image").into_response()
        }
    }
}
