use axum::{Router, routing::get};
use tower_http::compression::CompressionLayer;
use utoipa_swagger_ui::SwaggerUi;

use crate::features::{health::health_check, image::create_image_router};
use crate::openapi::build_openapi;
use crate::request_id::request_id_middleware;
use crate::state::AppState;

fn compression_predicate() -> impl tower_http::compression::predicate::Predicate {
    use tower_http::compression::predicate::{NotForContentType, Predicate, SizeAbove};

    // 名片 PNG 已是压缩格式，只压缩 JSON/文本等响应
    SizeAbove::default()
        .and(NotForContentType::GRPC)
        .and(NotForContentType::IMAGES)
        .and(NotForContentType::SSE)
        .and(NotForContentType::const_new("application/octet-stream"))
}

/// 组装完整路由：业务接口挂在 `api_prefix` 下，`/health` 与文档挂在根路径。
pub fn build_router(state: AppState, api_prefix: &str) -> Router {
    let prefix = normalize_prefix(api_prefix);
    let prefix = prefix.as_str();
    let api_router = create_image_router();

    let app = Router::<AppState>::new().route("/health", get(health_check));
    // axum 不允许在根路径 nest，空前缀时直接合并
    let app = if prefix.is_empty() {
        app.merge(api_router)
    } else {
        app.nest(prefix, api_router)
    };

    app.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", build_openapi(prefix)))
        .with_state(state)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(CompressionLayer::new().compress_when(compression_predicate()))
}

/// 规范化前缀：去掉首尾空白与末尾 `/`，非空时保证以 `/` 开头
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() || trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
