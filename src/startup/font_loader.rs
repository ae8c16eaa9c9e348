use std::time::Instant;

use crate::config::FontsConfig;
use crate::error::AppError;
use crate::features::text::FontSet;

/// 在阻塞线程池中加载字体集合（字体解析与系统字体扫描都是同步 IO）
pub async fn load_font_set(cfg: &FontsConfig) -> Result<FontSet, AppError> {
    let cfg = cfg.clone();
    let t_load = Instant::now();
    let fonts = tokio::task::spawn_blocking(move || FontSet::load(&cfg))
        .await
        .map_err(|e| AppError::Internal(format!("字体加载任务执行失败: {e}")))?;
    tracing::info!("字体加载耗时: {}ms", t_load.elapsed().as_millis());
    Ok(fonts)
}
