use axum::body::Bytes;
use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
    routing::get,
};

use super::types::CardQuery;
use crate::{error::AppError, state::AppState};

#[utoipa::path(
    get,
    path = "/bnr",
    summary = "生成玩家名片",
    description = "校验访问口令后获取玩家资料、背景与头像，合成名片并以 PNG 返回。头像不可用时以灰色方块占位。",
    params(CardQuery),
    responses(
        (status = 200, description = "PNG bytes of the profile card", content_type = "image/png"),
        (status = 400, description = "缺少 uid", body = String, content_type = "text/plain"),
        (status = 403, description = "口令错误", body = String, content_type = "text/plain"),
        (status = 500, description = "玩家资料或背景图获取失败", body = String, content_type = "text/plain")
    ),
    tag = "Card"
)]
pub async fn render_card(
    State(state): State<AppState>,
    Query(q): Query<CardQuery>,
) -> Result<impl IntoResponse, AppError> {
    // 先校验口令，口令错误时不触发任何上游请求
    if q.key.as_deref() != Some(&*state.secret_key) {
        return Err(AppError::Forbidden("口令错误".to_string()));
    }
    let uid = match q.uid.as_deref().map(str::trim) {
        Some(uid) if !uid.is_empty() => uid,
        _ => return Err(AppError::MissingInput("uid".to_string())),
    };

    let png = state.cards.render(uid).await?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/png"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok((StatusCode::OK, headers, Bytes::from(png)))
}

pub fn create_image_router() -> Router<AppState> {
    Router::new().route("/bnr", get(render_card))
}
