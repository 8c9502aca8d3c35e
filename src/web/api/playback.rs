use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::UrlQuery;
use crate::runtime::playback::{PlaybackError, PlaybackMedia};
use crate::web::state::AppState;
use crate::web::utils::errors::{
    bad_gateway_json, bad_request_json, error_response, forbidden_json, internal_error_json,
};

pub const MEDIA_LABEL_HEADER: &str = "x-media-label";
pub const MEDIA_WARNING_HEADER: &str = "x-media-warning";

/// 播放接口：返回可直接播放的媒体数据
pub async fn handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UrlQuery>,
) -> Response {
    let Some(url) = query.url.filter(|u| !u.trim().is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, bad_request_json("missing `url`"));
    };

    match state.playback.prepare(&url).await {
        Ok(media) => media_response(media),
        Err(e @ PlaybackError::OutOfScope(_)) => {
            error_response(StatusCode::FORBIDDEN, forbidden_json(&e.to_string()))
        }
        Err(e) => {
            tracing::warn!("[Playback] {}", e);
            error_response(StatusCode::BAD_GATEWAY, bad_gateway_json(&e.to_string()))
        }
    }
}

fn media_response(media: PlaybackMedia) -> Response {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, media.content_type.as_str())
        .header(header::CONTENT_LENGTH, media.bytes.len().to_string())
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", media.file_name.replace('"', "")),
        );

    if let Ok(label) = HeaderValue::from_str(&media.label) {
        builder = builder.header(HeaderName::from_static(MEDIA_LABEL_HEADER), label);
    }
    for warning in &media.warnings {
        if let Ok(value) = HeaderValue::from_str(warning) {
            builder = builder.header(HeaderName::from_static(MEDIA_WARNING_HEADER), value);
        }
    }

    builder.body(Body::from(media.bytes)).unwrap_or_else(|e| {
        tracing::error!("[Playback] Failed to build response: {}", e);
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            internal_error_json(&e.to_string()),
        )
    })
}
