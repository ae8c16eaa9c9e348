use std::sync::Arc;
use std::time::Instant;

use image::RgbaImage;
use tokio::sync::Semaphore;

use super::compositor::{self, AVATAR_SIZE, CardText};
use super::fetcher::ImageFetcher;
use crate::config::{AppConfig, AvatarCandidate, BackgroundSource};
use crate::error::{AppError, FetchError};
use crate::features::profile::{PlayerProfile, ProfileClient};
use crate::features::text::FontSet;

/// 名片生成：资料获取 → 背景/头像并发获取 → 阻塞线程池合成与编码
pub struct CardService {
    fonts: Arc<FontSet>,
    profiles: ProfileClient,
    images: ImageFetcher,
    background: BackgroundSource,
    avatar_candidates: Vec<AvatarCandidate>,
    signature: String,
    render_semaphore: Arc<Semaphore>,
}

impl CardService {
    pub fn new(config: &AppConfig, fonts: Arc<FontSet>) -> Result<Self, AppError> {
        let upstream = &config.upstream;
        let profiles = ProfileClient::new(upstream)
            .map_err(|e| AppError::Internal(format!("资料客户端初始化失败: {e}")))?;
        let images = ImageFetcher::new(upstream)
            .map_err(|e| AppError::Internal(format!("图片客户端初始化失败: {e}")))?;

        Ok(Self {
            fonts,
            profiles,
            images,
            background: upstream.background.clone(),
            avatar_candidates: upstream.avatar_candidates.clone(),
            signature: config.card.signature.clone(),
            render_semaphore: Arc::new(Semaphore::new(config.image.effective_parallel())),
        })
    }

    pub fn fonts(&self) -> &FontSet {
        &self.fonts
    }

    /// 生成指定玩家的名片 PNG
    pub async fn render(&self, uid: &str) -> Result<Vec<u8>, AppError> {
        let t_start = Instant::now();

        let profile = self
            .profiles
            .fetch(uid)
            .await
            .map_err(|e| AppError::UpstreamData(e.to_string()))?;

        let avatar_ids = self.avatar_ids(&profile);
        let (background, avatar) = tokio::join!(
            self.fetch_background(&profile),
            self.images
                .fetch_first(&avatar_ids, Some((AVATAR_SIZE, AVATAR_SIZE))),
        );
        let background = background.map_err(|e| AppError::UpstreamImage(e.to_string()))?;
        let avatar = match avatar {
            Ok(img) => Some(img),
            Err(e) => {
                tracing::info!(uid = %profile.uid, "头像不可用，使用占位图: {}", e);
                None
            }
        };
        let fetch_ms = t_start.elapsed().as_millis();

        let t_wait = Instant::now();
        let _permit = self
            .render_semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| AppError::Internal(format!("获取渲染许可失败: {e}")))?;
        let wait_ms = t_wait.elapsed().as_millis();

        let text = CardText {
            nickname: profile.nickname,
            level: profile.level,
            liked: profile.liked,
            uid: profile.uid,
            signature: self.signature.clone(),
        };
        let fonts = Arc::clone(&self.fonts);
        let t_render = Instant::now();
        // 合成与 PNG 编码均为 CPU 密集型，移出 tokio worker
        let png = tokio::task::spawn_blocking(move || {
            let card = compositor::compose_card(background, avatar.as_ref(), &text, &fonts);
            compositor::encode_png(&card)
        })
        .await
        .map_err(|e| AppError::Internal(format!("渲染任务执行失败: {e}")))??;

        tracing::debug!(
            target: "bnr_backend::card",
            fetch_ms,
            wait_ms,
            render_ms = t_render.elapsed().as_millis(),
            total_ms = t_start.elapsed().as_millis(),
            bytes = png.len(),
            "名片生成完成"
        );
        Ok(png)
    }

    async fn fetch_background(&self, profile: &PlayerProfile) -> Result<RgbaImage, FetchError> {
        match &self.background {
            BackgroundSource::Fixed { url } => self.images.fetch(url, None).await,
            BackgroundSource::Banner => match profile.banner_id.as_deref() {
                Some(id) if id != "0" => self.images.fetch_item(id, None).await,
                _ => Err(FetchError::NoCandidate),
            },
        }
    }

    /// 按配置优先级收集头像候选 ID（跳过缺失与 "0"）
    fn avatar_ids(&self, profile: &PlayerProfile) -> Vec<String> {
        candidate_ids(&self.avatar_candidates, profile)
    }
}

fn candidate_ids(order: &[AvatarCandidate], profile: &PlayerProfile) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for candidate in order {
        let id = match candidate {
            AvatarCandidate::Avatar => profile.avatar_id.as_ref(),
            AvatarCandidate::HeadPic => profile.head_pic_id.as_ref(),
            AvatarCandidate::Banner => profile.banner_id.as_ref(),
        };
        if let Some(id) = id
            && id != "0"
            && !ids.contains(id)
        {
            ids.push(id.clone());
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> PlayerProfile {
        PlayerProfile {
            nickname: "Ahmed".into(),
            level: 45,
            liked: 1200,
            uid: "100200300".into(),
            avatar_id: Some("102000007".into()),
            head_pic_id: Some("0".into()),
            banner_id: Some("901000001".into()),
        }
    }

    #[test]
    fn candidates_follow_configured_order() {
        let order = [
            AvatarCandidate::Banner,
            AvatarCandidate::HeadPic,
            AvatarCandidate::Avatar,
        ];
        assert_eq!(candidate_ids(&order, &profile()), vec!["901000001", "102000007"]);
    }

    #[test]
    fn absent_and_zero_ids_are_skipped() {
        let mut p = profile();
        p.avatar_id = None;
        let order = [AvatarCandidate::Avatar, AvatarCandidate::HeadPic];
        assert!(candidate_ids(&order, &p).is_empty());
    }

    #[test]
    fn duplicate_ids_are_tried_once() {
        let mut p = profile();
        p.avatar_id = p.banner_id.clone();
        let order = [AvatarCandidate::Avatar, AvatarCandidate::Banner];
        assert_eq!(candidate_ids(&order, &p), vec!["901000001"]);
    }
}
