use axum::{extract::State, response::Json};
use serde::Serialize;

use crate::features::text::{DEFAULT_SIZES, FontSet, MissingGlyphFace};
use crate::state::AppState;

/// 已加载字体概况
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct FontSummary {
    /// 主字体名（最小字号下的实际字体）
    #[schema(example = "DejaVuSans")]
    pub primary: String,
    /// 已加载的字号
    #[schema(example = json!([30, 40, 50]))]
    pub sizes: Vec<u32>,
    /// 配置的后备字体数
    pub fallbacks_configured: usize,
    /// 实际可用的后备字体数
    pub fallbacks_loaded: usize,
}

impl FontSummary {
    fn of(fonts: &FontSet) -> Self {
        let sizes: Vec<u32> = fonts.sizes().collect();
        let first = sizes.first().copied().unwrap_or(DEFAULT_SIZES[0]);
        Self {
            primary: fonts.primary(first).label().to_string(),
            sizes,
            fallbacks_configured: fonts.fallbacks().len(),
            fallbacks_loaded: fonts.fallbacks().iter().filter(|f| f.is_available()).count(),
        }
    }

    /// 主字体只剩缺字框时，名片文字全部画成方框
    fn is_degraded(&self) -> bool {
        self.primary == MissingGlyphFace::LABEL
    }
}

/// 健康检查响应
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// `healthy`，或主字体不可用时为 `degraded`
    #[schema(example = "healthy")]
    pub status: String,
    #[schema(example = "bnr-backend")]
    pub service: String,
    #[schema(example = "0.1.0")]
    pub version: String,
    pub fonts: FontSummary,
}

#[utoipa::path(
    get,
    path = "/health",
    summary = "健康检查",
    description = "返回服务版本与字体加载情况；主字体退化为缺字框时 status 为 degraded，HTTP 状态仍为 200。",
    responses((status = 200, description = "服务存活", body = HealthResponse)),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let fonts = FontSummary::of(state.cards.fonts());
    let status = if fonts.is_degraded() { "degraded" } else { "healthy" };
    Json(HealthResponse {
        status: status.to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        fonts,
    })
}
