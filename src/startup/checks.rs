use reqwest::Url;

use crate::config::{AppConfig, BackgroundSource};
use crate::error::AppError;

/// 执行启动检查
///
/// 1. 校验上游 URL（格式错误直接阻断启动）
/// 2. 检查字体目录与字体文件（仅告警，缺失的字体运行时会被跳过）
/// 3. 检查访问口令
pub async fn run_startup_checks(config: &AppConfig) -> Result<(), AppError> {
    tracing::info!("🔍 开始执行启动检查...");

    check_upstream_urls(config)?;
    check_font_files(config);
    check_secret_key(config);

    tracing::info!("✅ 启动检查完成");
    Ok(())
}

fn check_upstream_urls(config: &AppConfig) -> Result<(), AppError> {
    let upstream = &config.upstream;
    let mut urls = vec![
        ("upstream.profile_url", upstream.profile_url.as_str()),
        ("upstream.image_url", upstream.image_url.as_str()),
    ];
    if let BackgroundSource::Fixed { url } = &upstream.background {
        urls.push(("upstream.background.url", url.as_str()));
    }

    for (name, url) in urls {
        let parsed = Url::parse(url)
            .map_err(|e| AppError::Internal(format!("{name} 不是合法的 URL ({url}): {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::Internal(format!(
                "{name} 仅支持 http/https: {url}"
            )));
        }
    }
    tracing::info!("✅ 上游地址校验通过");
    Ok(())
}

/// 确保字体文件存在（必要时仅告警）
fn check_font_files(config: &AppConfig) {
    let dir = config.fonts.dir_path();
    if !dir.is_dir() {
        tracing::warn!("📁 未找到字体目录: {:?}，将使用系统默认字体", dir);
        return;
    }

    let primary = dir.join(&config.fonts.primary);
    if primary.is_file() {
        tracing::info!("✅ 主字体存在: {:?}", primary);
    } else {
        tracing::warn!("⚠️ 未找到主字体: {:?}，将使用系统默认字体", primary);
    }

    let missing: Vec<&str> = config
        .fonts
        .fallbacks
        .iter()
        .filter(|name| !dir.join(name).is_file())
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        tracing::warn!("⚠️ 缺少后备字体（将被跳过）: {:?}", missing);
    }
}

fn check_secret_key(config: &AppConfig) {
    if config.auth.secret_key.is_empty() {
        tracing::warn!("⚠️ auth.secret_key 为空，任何携带空 key 的请求都能通过校验");
    }
}
