use utoipa::OpenApi;
use utoipa::openapi::server::ServerBuilder;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::health::handler::health_check,
        crate::features::image::handler::render_card,
    ),
    components(schemas(
        crate::features::health::handler::HealthResponse,
        crate::features::health::handler::FontSummary,
    )),
    tags(
        (name = "Card", description = "玩家名片：按 UID 生成 PNG 名片。"),
        (name = "Health", description = "健康检查：服务存活与字体加载情况。"),
    ),
    info(
        title = "BNR Backend API",
        version = env!("CARGO_PKG_VERSION"),
        description = "玩家名片生成服务（Axum + utoipa）。/bnr 挂载在 `config.api.prefix` 下（默认为空），OpenAPI 的 paths 不包含该前缀。"
    )
)]
pub struct ApiDoc;

/// 生成 OpenAPI 文档；前缀非空时额外声明业务接口的 server，便于 Swagger UI 直接调试。
pub fn build_openapi(api_prefix: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    if !api_prefix.is_empty() {
        let api = ServerBuilder::new()
            .url(api_prefix)
            .description(Some("业务接口（config.api.prefix）"))
            .build();
        let root = ServerBuilder::new()
            .url("/")
            .description(Some("根路径（用于 /health）"))
            .build();
        doc.servers = Some(vec![api, root]);
    }
    doc
}
