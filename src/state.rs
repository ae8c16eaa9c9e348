use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::features::image::CardService;
use crate::features::text::FontSet;

/// 聚合的应用共享状态
#[derive(Clone)]
pub struct AppState {
    /// 访问口令
    pub secret_key: Arc<str>,
    /// 名片生成服务（持有只读字体集合与上游客户端）
    pub cards: Arc<CardService>,
}

impl AppState {
    pub fn new(config: &AppConfig, fonts: Arc<FontSet>) -> Result<Self, AppError> {
        Ok(Self {
            secret_key: Arc::from(config.auth.secret_key.as_str()),
            cards: Arc::new(CardService::new(config, fonts)?),
        })
    }
}
