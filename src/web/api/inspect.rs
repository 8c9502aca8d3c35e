use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::UrlQuery;
use crate::runtime::inspector::InspectError;
use crate::web::state::AppState;
use crate::web::utils::errors::{bad_request_json, error_response, forbidden_json};

/// 文件类型识别接口
///
/// 返回魔数识别结果；`.pdf` 占位时附带扩展名校正过程。
pub async fn handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UrlQuery>,
) -> Response {
    let Some(url) = query.url.filter(|u| !u.trim().is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, bad_request_json("missing `url`"));
    };

    match state.inspector.inspect(url.trim()).await {
        Ok(inspection) => Json(inspection).into_response(),
        Err(e @ InspectError::OutOfScope(_)) => {
            tracing::info!("[Inspect] Rejected: {}", e);
            error_response(StatusCode::FORBIDDEN, forbidden_json(&e.to_string()))
        }
    }
}
